//! Organization repository contract and SQLite implementation.

use crate::model::organization::{Organization, OrganizationId};
use crate::model::text::slugify;
use crate::repo::{ensure_schema, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

pub trait OrganizationRepository {
    /// Inserts `organization`; an empty slug is derived from the name.
    fn create_organization(&self, organization: &Organization) -> RepoResult<OrganizationId>;
    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<Organization>>;
    fn get_organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>>;
    /// Renaming is the only mutation allowed once users or posts reference
    /// the organization. The slug is left untouched.
    fn rename_organization(&self, id: OrganizationId, name: &str) -> RepoResult<()>;
}

pub struct SqliteOrganizationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteOrganizationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, &[("organizations", &["uuid", "name", "slug"])])?;
        Ok(Self { conn })
    }

    fn query_one(&self, column: &str, value: &str) -> RepoResult<Option<Organization>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT uuid, name, slug FROM organizations WHERE {column} = ?1;"
        ))?;
        let mut rows = stmt.query([value])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_organization_row(row)?)),
            None => Ok(None),
        }
    }
}

impl OrganizationRepository for SqliteOrganizationRepository<'_> {
    fn create_organization(&self, organization: &Organization) -> RepoResult<OrganizationId> {
        let slug = if organization.slug.is_empty() {
            slugify(&organization.name)
        } else {
            organization.slug.clone()
        };

        self.conn.execute(
            "INSERT INTO organizations (uuid, name, slug) VALUES (?1, ?2, ?3);",
            params![organization.id.to_string(), organization.name.as_str(), slug],
        )?;
        Ok(organization.id)
    }

    fn get_organization(&self, id: OrganizationId) -> RepoResult<Option<Organization>> {
        self.query_one("uuid", &id.to_string())
    }

    fn get_organization_by_slug(&self, slug: &str) -> RepoResult<Option<Organization>> {
        self.query_one("slug", slug)
    }

    fn rename_organization(&self, id: OrganizationId, name: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE organizations SET name = ?1 WHERE uuid = ?2;",
            params![name, id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "organization",
                id,
            });
        }
        Ok(())
    }
}

fn parse_organization_row(row: &Row<'_>) -> RepoResult<Organization> {
    Ok(Organization {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "organizations.uuid")?,
        name: row.get("name")?,
        slug: row.get("slug")?,
    })
}
