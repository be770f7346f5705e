//! Department record and membership labels.

use crate::model::organization::OrganizationId;
use crate::model::text::{slugify, title_case};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type DepartmentId = Uuid;

/// Organization-scoped grouping of users. Unique on `(organization_id, slug)`.
///
/// Lists of departments are ordered by `(slug, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub slug: String,
}

impl Department {
    pub fn new(
        organization_id: OrganizationId,
        name: impl Into<String>,
        slug: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            slug: slug.into(),
        }
    }

    /// Builds a department from free-form input: the name is trimmed and
    /// title-cased, the slug derived from the cleaned name.
    pub fn from_input(organization_id: OrganizationId, raw_name: &str) -> Self {
        let name = title_case(raw_name.trim());
        let slug = slugify(&name);
        Self::new(organization_id, name, slug)
    }

    /// `"{name} - {organization name}"`.
    pub fn label(&self, organization_name: &str) -> String {
        format!("{} - {}", self.name, organization_name)
    }
}
