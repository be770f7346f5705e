//! User account record and permission predicates.
//!
//! # Invariants
//! - `email` is stored lowercased; normalization happens on save.
//! - An empty `employee_id` means "derive on next save".
//! - `is_active == false` is the soft-delete tombstone.
//! - An empty `password` means no usable password has been set.

use crate::model::department::Department;
use crate::model::organization::OrganizationId;
use crate::model::post::Post;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string; never serialized back out.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_admin_staff: bool,
    /// Peer-to-peer staff may recognize users of their own organization only.
    pub is_p2p_staff: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Creates an active, unprivileged, not-yet-persisted user.
    pub fn new(organization_id: OrganizationId, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            email: email.into(),
            employee_id: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
            is_admin_staff: false,
            is_p2p_staff: false,
            created_at: 0,
            updated_at: 0,
        }
    }

    pub fn get_username(&self) -> &str {
        &self.email
    }

    pub fn get_short_name(&self) -> &str {
        if self.first_name.is_empty() {
            &self.email
        } else {
            &self.first_name
        }
    }

    pub fn has_usable_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Returns true if the user holds `perm`, optionally on `obj`.
    ///
    /// Active superusers hold everything. Staff hold a named permission on an
    /// object iff the object lives in their organization. Everything else is
    /// denied.
    pub fn has_perm(&self, perm: &str, obj: Option<&dyn OrganizationScoped>) -> bool {
        if self.is_active && self.is_superuser {
            return true;
        }

        if self.is_staff && !perm.is_empty() {
            if let Some(organization_id) = obj.and_then(|scoped| scoped.organization_id()) {
                return self.organization_id == organization_id;
            }
        }

        false
    }

    /// True iff every permission in `perms` passes [`User::has_perm`].
    /// An empty list is vacuously true.
    pub fn has_perms(&self, perms: &[&str], obj: Option<&dyn OrganizationScoped>) -> bool {
        perms.iter().all(|perm| self.has_perm(perm, obj))
    }

    /// The app label is not consulted: only active superusers pass.
    pub fn has_module_perms(&self, _app_label: &str) -> bool {
        self.is_active && self.is_superuser
    }
}

/// Objects that belong to an organization and can be permission-checked
/// against a staff user's organization.
pub trait OrganizationScoped {
    fn organization_id(&self) -> Option<OrganizationId>;
}

impl OrganizationScoped for User {
    fn organization_id(&self) -> Option<OrganizationId> {
        Some(self.organization_id)
    }
}

impl OrganizationScoped for Post {
    fn organization_id(&self) -> Option<OrganizationId> {
        Some(self.organization_id)
    }
}

impl OrganizationScoped for Department {
    fn organization_id(&self) -> Option<OrganizationId> {
        Some(self.organization_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{OrganizationScoped, User};
    use crate::model::organization::OrganizationId;
    use crate::model::post::{Post, SharedWith};
    use uuid::Uuid;

    struct Unscoped;

    impl OrganizationScoped for Unscoped {
        fn organization_id(&self) -> Option<OrganizationId> {
            None
        }
    }

    fn staff(org: OrganizationId) -> User {
        let mut user = User::new(org, "staff@example.com");
        user.is_staff = true;
        user
    }

    #[test]
    fn active_superuser_has_every_permission() {
        let mut user = User::new(Uuid::new_v4(), "root@example.com");
        user.is_superuser = true;

        assert!(user.has_perm("", None));
        assert!(user.has_perms(&["feeds.add_post", "feeds.delete_post"], None));
        assert!(user.has_module_perms("feeds"));
    }

    #[test]
    fn inactive_superuser_has_nothing() {
        let mut user = User::new(Uuid::new_v4(), "root@example.com");
        user.is_superuser = true;
        user.is_active = false;

        assert!(!user.has_perm("feeds.add_post", None));
        assert!(!user.has_module_perms("feeds"));
    }

    #[test]
    fn staff_permission_follows_object_organization() {
        let org = Uuid::new_v4();
        let user = staff(org);
        let own_post = Post::new(org, user.id, "hi", SharedWith::MyDepartment);
        let foreign_post = Post::new(Uuid::new_v4(), user.id, "hi", SharedWith::MyDepartment);

        assert!(user.has_perm("feeds.change_post", Some(&own_post)));
        assert!(!user.has_perm("feeds.change_post", Some(&foreign_post)));
        assert!(!user.has_perm("", Some(&own_post)));
        assert!(!user.has_perm("feeds.change_post", None));
        assert!(!user.has_perm("feeds.change_post", Some(&Unscoped)));
        assert!(!user.has_module_perms("feeds"));
    }

    #[test]
    fn has_perms_requires_all_and_accepts_empty_list() {
        let org = Uuid::new_v4();
        let user = staff(org);
        let colleague = User::new(org, "peer@example.com");

        assert!(user.has_perms(&[], None));
        assert!(user.has_perms(&["a", "b"], Some(&colleague)));
        assert!(!user.has_perms(&["a", ""], Some(&colleague)));
    }

    #[test]
    fn short_name_falls_back_to_email() {
        let mut user = User::new(Uuid::new_v4(), "ann@example.com");
        assert_eq!(user.get_short_name(), "ann@example.com");
        user.first_name = "Ann".to_string();
        assert_eq!(user.get_short_name(), "Ann");
        assert_eq!(user.get_username(), "ann@example.com");
    }
}
