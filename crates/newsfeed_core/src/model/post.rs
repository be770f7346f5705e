//! Feed post record and the priority validation error.

use crate::model::organization::OrganizationId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type PostId = Uuid;

/// Audience of a post inside its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedWith {
    /// Visible to the author's department co-members.
    MyDepartment,
    /// Visible to every department-holding user of the organization.
    AllDepartments,
}

impl SharedWith {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::MyDepartment => "my_department",
            Self::AllDepartments => "all_departments",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "my_department" => Some(Self::MyDepartment),
            "all_departments" => Some(Self::AllDepartments),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub organization_id: OrganizationId,
    pub created_by: UserId,
    pub content: String,
    /// At most one priority post per accessible set; see
    /// [`crate::service::post_service::validate_priority`].
    pub priority: bool,
    pub shared_with: SharedWith,
    /// Epoch milliseconds, assigned by storage.
    pub created_at: i64,
}

impl Post {
    pub fn new(
        organization_id: OrganizationId,
        created_by: UserId,
        content: impl Into<String>,
        shared_with: SharedWith,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            created_by,
            content: content.into(),
            priority: false,
            shared_with,
            created_at: 0,
        }
    }

    pub fn with_priority(mut self, priority: bool) -> Self {
        self.priority = priority;
        self
    }
}

/// Rejection of a write, keyed to the offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    /// Already localized.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Error for ValidationError {}
