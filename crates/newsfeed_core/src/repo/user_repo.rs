//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Normalize identity (email, employee id) on every save.
//! - Expose soft deletion only; user rows are never removed.
//!
//! # Invariants
//! - Saved emails are lowercase.
//! - A saved user always has a non-empty `employee_id`.
//! - Soft-deleted users keep occupying their email and employee id.
//!
//! Employee id allocation is check-then-write. Two concurrent saves can pick
//! the same candidate; the loser fails on the UNIQUE constraint with
//! `RepoError::Db` (see [`RepoError::is_unique_violation`]) and may retry.

use crate::model::organization::OrganizationId;
use crate::model::user::{User, UserId};
use crate::repo::{
    bool_to_int, ensure_schema, parse_bool, parse_uuid, RepoError, RepoResult,
};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    organization_uuid,
    email,
    employee_id,
    first_name,
    last_name,
    password,
    is_active,
    is_staff,
    is_superuser,
    is_admin_staff,
    is_p2p_staff,
    created_at,
    updated_at
FROM users";

pub trait UserRepository {
    /// Normalizes and upserts `user`, writing back the normalized email,
    /// allocated employee id and storage timestamps.
    fn save_user(&self, user: &mut User) -> RepoResult<()>;
    /// Loads a user regardless of `is_active`.
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// True once the user has been saved at least once.
    fn user_exists(&self, id: UserId) -> RepoResult<bool>;
    /// True if a user other than `exclude` holds `employee_id`.
    fn employee_id_in_use(&self, employee_id: &str, exclude: Option<UserId>) -> RepoResult<bool>;
    fn list_organization_users(
        &self,
        organization_id: OrganizationId,
        include_inactive: bool,
    ) -> RepoResult<Vec<User>>;
    /// Flips `is_active` off. The row and its dependents stay in place.
    fn soft_delete_user(&self, id: UserId) -> RepoResult<()>;
    /// Bulk form of [`UserRepository::soft_delete_user`]; returns rows matched.
    fn soft_delete_users(&self, ids: &[UserId]) -> RepoResult<usize>;
    fn soft_delete_organization_users(&self, organization_id: OrganizationId) -> RepoResult<usize>;
}

/// Picks the first free employee id derived from `email`, prefixing `_`
/// for every collision.
pub fn allocate_employee_id(
    email: &str,
    mut in_use: impl FnMut(&str) -> RepoResult<bool>,
) -> RepoResult<String> {
    let mut candidate = email.to_string();
    while in_use(&candidate)? {
        candidate.insert(0, '_');
    }
    Ok(candidate)
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[(
                "users",
                &[
                    "uuid",
                    "organization_uuid",
                    "email",
                    "employee_id",
                    "password",
                    "is_active",
                ],
            )],
        )?;
        Ok(Self { conn })
    }

    fn query_one(&self, column: &str, value: &str) -> RepoResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE {column} = ?1;"),
                [value],
                |row| Ok(parse_user_row(row)),
            )
            .optional()?;
        user.transpose()
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn save_user(&self, user: &mut User) -> RepoResult<()> {
        user.email = user.email.to_lowercase();
        if user.employee_id.is_empty() {
            let own_id = user.id;
            user.employee_id = allocate_employee_id(&user.email, |candidate| {
                self.employee_id_in_use(candidate, Some(own_id))
            })?;
            debug!(
                "event=employee_id_allocate module=repo status=ok user={} prefix_len={}",
                user.id,
                user.employee_id.len() - user.employee_id.trim_start_matches('_').len()
            );
        }

        self.conn.execute(
            "INSERT INTO users (
                uuid,
                organization_uuid,
                email,
                employee_id,
                first_name,
                last_name,
                password,
                is_active,
                is_staff,
                is_superuser,
                is_admin_staff,
                is_p2p_staff
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT (uuid) DO UPDATE SET
                organization_uuid = excluded.organization_uuid,
                email = excluded.email,
                employee_id = excluded.employee_id,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                password = excluded.password,
                is_active = excluded.is_active,
                is_staff = excluded.is_staff,
                is_superuser = excluded.is_superuser,
                is_admin_staff = excluded.is_admin_staff,
                is_p2p_staff = excluded.is_p2p_staff,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                user.id.to_string(),
                user.organization_id.to_string(),
                user.email.as_str(),
                user.employee_id.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                user.password.as_str(),
                bool_to_int(user.is_active),
                bool_to_int(user.is_staff),
                bool_to_int(user.is_superuser),
                bool_to_int(user.is_admin_staff),
                bool_to_int(user.is_p2p_staff),
            ],
        )?;

        let (created_at, updated_at) = self.conn.query_row(
            "SELECT created_at, updated_at FROM users WHERE uuid = ?1;",
            [user.id.to_string()],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
        )?;
        user.created_at = created_at;
        user.updated_at = updated_at;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.query_one("uuid", &id.to_string())
    }

    fn get_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.query_one("email", &email.to_lowercase())
    }

    fn user_exists(&self, id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn employee_id_in_use(
        &self,
        employee_id: &str,
        exclude: Option<UserId>,
    ) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM users
                WHERE employee_id = ?1
                  AND (?2 IS NULL OR uuid <> ?2)
            );",
            params![employee_id, exclude.map(|id| id.to_string())],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_organization_users(
        &self,
        organization_id: OrganizationId,
        include_inactive: bool,
    ) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL}
             WHERE organization_uuid = ?1
               AND (?2 = 1 OR is_active = 1)
             ORDER BY email ASC;"
        ))?;
        let mut rows = stmt.query(params![
            organization_id.to_string(),
            bool_to_int(include_inactive)
        ])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(row)?);
        }
        Ok(users)
    }

    fn soft_delete_user(&self, id: UserId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                is_active = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        info!("event=user_soft_delete module=repo status=ok user={id}");
        Ok(())
    }

    fn soft_delete_users(&self, ids: &[UserId]) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let binds: Vec<Value> = ids.iter().map(|id| Value::Text(id.to_string())).collect();
        let changed = self.conn.execute(
            &format!(
                "UPDATE users
                 SET
                    is_active = 0,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid IN ({placeholders});"
            ),
            params_from_iter(binds),
        )?;
        info!("event=user_soft_delete_bulk module=repo status=ok matched={changed}");
        Ok(changed)
    }

    fn soft_delete_organization_users(
        &self,
        organization_id: OrganizationId,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                is_active = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE organization_uuid = ?1;",
            [organization_id.to_string()],
        )?;
        info!(
            "event=user_soft_delete_bulk module=repo status=ok organization={organization_id} matched={changed}"
        );
        Ok(changed)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "users.uuid")?,
        organization_id: parse_uuid(
            &row.get::<_, String>("organization_uuid")?,
            "users.organization_uuid",
        )?,
        email: row.get("email")?,
        employee_id: row.get("employee_id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        password: row.get("password")?,
        is_active: parse_bool(row.get("is_active")?, "users.is_active")?,
        is_staff: parse_bool(row.get("is_staff")?, "users.is_staff")?,
        is_superuser: parse_bool(row.get("is_superuser")?, "users.is_superuser")?,
        is_admin_staff: parse_bool(row.get("is_admin_staff")?, "users.is_admin_staff")?,
        is_p2p_staff: parse_bool(row.get("is_p2p_staff")?, "users.is_p2p_staff")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::allocate_employee_id;
    use std::collections::HashSet;

    #[test]
    fn allocate_employee_id_prefixes_until_free() {
        let taken: HashSet<&str> = ["ann@example.com", "_ann@example.com"].into_iter().collect();
        let allocated =
            allocate_employee_id("ann@example.com", |candidate| Ok(taken.contains(candidate)))
                .unwrap();
        assert_eq!(allocated, "__ann@example.com");
    }

    #[test]
    fn allocate_employee_id_keeps_free_email() {
        let allocated = allocate_employee_id("bob@example.com", |_| Ok(false)).unwrap();
        assert_eq!(allocated, "bob@example.com");
    }
}
