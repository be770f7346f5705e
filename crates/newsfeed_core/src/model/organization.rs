//! Organization (tenant) record.

use crate::model::text::slugify;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type OrganizationId = Uuid;

/// Top-level tenant boundary. Only the name may change once referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Globally unique.
    pub slug: String,
}

impl Organization {
    /// Creates an organization whose slug is derived from `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self::with_slug(name, slug)
    }

    pub fn with_slug(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
        }
    }
}
