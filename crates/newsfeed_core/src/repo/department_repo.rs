//! Department and membership repository.
//!
//! # Invariants
//! - `(organization, slug)` is unique; `get_or_create_department` relies on it.
//! - Department lists are ordered by `(slug, uuid)`.
//! - Membership rows are kept for soft-deleted users.

use crate::model::department::{Department, DepartmentId};
use crate::model::organization::OrganizationId;
use crate::model::user::UserId;
use crate::repo::{ensure_schema, parse_uuid, RepoResult};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait DepartmentRepository {
    fn create_department(&self, department: &Department) -> RepoResult<DepartmentId>;
    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>>;
    /// Returns the department with `slug` in `organization_id`, creating it
    /// with `name` when missing. The flag is true when a row was inserted.
    fn get_or_create_department(
        &self,
        organization_id: OrganizationId,
        slug: &str,
        name: &str,
    ) -> RepoResult<(Department, bool)>;
    /// Adding an existing member is a no-op.
    fn add_member(&self, department_id: DepartmentId, user_id: UserId) -> RepoResult<()>;
    fn remove_member(&self, department_id: DepartmentId, user_id: UserId) -> RepoResult<()>;
    fn list_members(&self, department_id: DepartmentId) -> RepoResult<Vec<UserId>>;
    fn list_user_departments(&self, user_id: UserId) -> RepoResult<Vec<Department>>;
    /// Union of the members of every department `user_id` belongs to,
    /// including `user_id` itself. Empty when the user has no department.
    fn co_member_ids(&self, user_id: UserId) -> RepoResult<Vec<UserId>>;
}

pub struct SqliteDepartmentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDepartmentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[
                (
                    "departments",
                    &["uuid", "organization_uuid", "name", "slug"],
                ),
                ("department_members", &["department_uuid", "user_uuid"]),
            ],
        )?;
        Ok(Self { conn })
    }

    fn find_by_slug(
        &self,
        organization_id: OrganizationId,
        slug: &str,
    ) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT uuid, organization_uuid, name, slug
                 FROM departments
                 WHERE organization_uuid = ?1 AND slug = ?2;",
                params![organization_id.to_string(), slug],
                |row| Ok(parse_department_row(row)),
            )
            .optional()?;
        department.transpose()
    }

    fn collect_user_ids(&self, sql: &str, key: String) -> RepoResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([key])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let text: String = row.get(0)?;
            ids.push(parse_uuid(&text, "department_members.user_uuid")?);
        }
        Ok(ids)
    }
}

impl DepartmentRepository for SqliteDepartmentRepository<'_> {
    fn create_department(&self, department: &Department) -> RepoResult<DepartmentId> {
        self.conn.execute(
            "INSERT INTO departments (uuid, organization_uuid, name, slug)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                department.id.to_string(),
                department.organization_id.to_string(),
                department.name.as_str(),
                department.slug.as_str(),
            ],
        )?;
        Ok(department.id)
    }

    fn get_department(&self, id: DepartmentId) -> RepoResult<Option<Department>> {
        let department = self
            .conn
            .query_row(
                "SELECT uuid, organization_uuid, name, slug FROM departments WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok(parse_department_row(row)),
            )
            .optional()?;
        department.transpose()
    }

    fn get_or_create_department(
        &self,
        organization_id: OrganizationId,
        slug: &str,
        name: &str,
    ) -> RepoResult<(Department, bool)> {
        if let Some(existing) = self.find_by_slug(organization_id, slug)? {
            return Ok((existing, false));
        }

        let department = Department::new(organization_id, name, slug);
        self.create_department(&department)?;
        debug!(
            "event=department_create module=repo status=ok organization={} slug={}",
            organization_id, slug
        );
        Ok((department, true))
    }

    fn add_member(&self, department_id: DepartmentId, user_id: UserId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO department_members (department_uuid, user_uuid)
             VALUES (?1, ?2);",
            params![department_id.to_string(), user_id.to_string()],
        )?;
        Ok(())
    }

    fn remove_member(&self, department_id: DepartmentId, user_id: UserId) -> RepoResult<()> {
        self.conn.execute(
            "DELETE FROM department_members WHERE department_uuid = ?1 AND user_uuid = ?2;",
            params![department_id.to_string(), user_id.to_string()],
        )?;
        Ok(())
    }

    fn list_members(&self, department_id: DepartmentId) -> RepoResult<Vec<UserId>> {
        self.collect_user_ids(
            "SELECT user_uuid
             FROM department_members
             WHERE department_uuid = ?1
             ORDER BY rowid ASC;",
            department_id.to_string(),
        )
    }

    fn list_user_departments(&self, user_id: UserId) -> RepoResult<Vec<Department>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.uuid, d.organization_uuid, d.name, d.slug
             FROM departments d
             INNER JOIN department_members m ON m.department_uuid = d.uuid
             WHERE m.user_uuid = ?1
             ORDER BY d.slug ASC, d.uuid ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut departments = Vec::new();
        while let Some(row) = rows.next()? {
            departments.push(parse_department_row(row)?);
        }
        Ok(departments)
    }

    fn co_member_ids(&self, user_id: UserId) -> RepoResult<Vec<UserId>> {
        self.collect_user_ids(
            "SELECT DISTINCT peers.user_uuid
             FROM department_members peers
             WHERE peers.department_uuid IN (
                SELECT own.department_uuid
                FROM department_members own
                WHERE own.user_uuid = ?1
             )
             ORDER BY peers.user_uuid ASC;",
            user_id.to_string(),
        )
    }
}

fn parse_department_row(row: &Row<'_>) -> RepoResult<Department> {
    Ok(Department {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "departments.uuid")?,
        organization_id: parse_uuid(
            &row.get::<_, String>("organization_uuid")?,
            "departments.organization_uuid",
        )?,
        name: row.get("name")?,
        slug: row.get("slug")?,
    })
}
