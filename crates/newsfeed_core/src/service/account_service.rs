//! Account lifecycle: identity, soft delete and password history.
//!
//! # Responsibility
//! - Route user saves through identity normalization.
//! - Keep the password-history ledger capped and answer reuse questions.
//!
//! # Invariants
//! - An empty raw password never changes the stored password or history.
//! - History is only written for users that already exist in storage; the
//!   first password of a brand-new user is not recorded.
//! - A user with no history entries is treated as still on the password
//!   they were provisioned with.
//! - `change_password` stores the new hash before writing history, so a
//!   failed save leaves history untouched. `set_password` writes history
//!   immediately and leaves the save to the caller.

use crate::config::AccountConfig;
use crate::model::organization::OrganizationId;
use crate::model::user::{User, UserId};
use crate::password::{hash_password, hash_password_with_fixed_salt, verify_password};
use crate::repo::password_history_repo::PasswordHistoryRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

pub struct AccountService<U: UserRepository, H: PasswordHistoryRepository> {
    users: U,
    history: H,
    config: AccountConfig,
}

impl<U: UserRepository, H: PasswordHistoryRepository> AccountService<U, H> {
    /// `config` is expected to have passed [`AccountConfig::validate`].
    pub fn new(users: U, history: H, config: AccountConfig) -> Self {
        Self {
            users,
            history,
            config,
        }
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    /// Lowercases the email, allocates an employee id if missing and upserts.
    pub fn save_user(&self, user: &mut User) -> RepoResult<()> {
        self.users.save_user(user)
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.users.get_user(id)
    }

    /// Soft delete: the row and its history stay queryable.
    pub fn delete_user(&self, user: &mut User) -> RepoResult<()> {
        user.is_active = false;
        self.users.save_user(user)
    }

    /// Bulk soft delete by id. Returns the number of matched rows.
    pub fn delete_users(&self, ids: &[UserId]) -> RepoResult<usize> {
        self.users.soft_delete_users(ids)
    }

    pub fn delete_organization_users(&self, organization_id: OrganizationId) -> RepoResult<usize> {
        self.users.soft_delete_organization_users(organization_id)
    }

    /// Sets a new password on `user` in memory; the caller persists it with
    /// [`AccountService::save_user`].
    ///
    /// The raw value is also appended to history when `user` has already
    /// been saved, so the history always covers the current password plus
    /// the ones before it.
    pub fn set_password(&self, user: &mut User, raw_password: &str) -> RepoResult<()> {
        if raw_password.is_empty() {
            return Ok(());
        }

        user.password = hash_password(raw_password)?;
        if self.users.user_exists(user.id)? {
            self.add_password(user.id, raw_password)?;
        }
        Ok(())
    }

    /// Loads, re-passwords and saves a stored user.
    pub fn change_password(&self, user_id: UserId, raw_password: &str) -> RepoResult<User> {
        let mut user = self.users.get_user(user_id)?.ok_or(RepoError::NotFound {
            entity: "user",
            id: user_id,
        })?;
        if raw_password.is_empty() {
            return Ok(user);
        }

        user.password = hash_password(raw_password)?;
        self.users.save_user(&mut user)?;
        self.add_password(user_id, raw_password)?;
        info!("event=password_change module=account status=ok user={user_id}");
        Ok(user)
    }

    pub fn check_password(&self, user: &User, raw_password: &str) -> RepoResult<bool> {
        Ok(verify_password(raw_password, &user.password)?)
    }

    /// Appends `raw_password` to the user's history, pruning oldest-first so
    /// at most `history_limit` entries remain.
    pub fn add_password(&self, user_id: UserId, raw_password: &str) -> RepoResult<()> {
        let hashed = self.history_hash(raw_password)?;
        self.history
            .append_capped(user_id, &hashed, self.config.history_limit)
    }

    /// True if the user registered under `email` has `raw_password` in
    /// their history.
    pub fn password_already_used(&self, email: &str, raw_password: &str) -> RepoResult<bool> {
        let hashed = self.history_hash(raw_password)?;
        self.history
            .hash_used_by_email(&email.to_lowercase(), &hashed)
    }

    pub fn using_default_password(&self, user_id: UserId) -> RepoResult<bool> {
        Ok(self.history.count_for_user(user_id)? == 0)
    }

    fn history_hash(&self, raw_password: &str) -> RepoResult<String> {
        Ok(hash_password_with_fixed_salt(
            raw_password,
            &self.config.history_salt,
        )?)
    }
}
