//! Department membership use-cases.

use crate::model::department::Department;
use crate::model::text::{slugify, title_case};
use crate::model::user::User;
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::organization_repo::OrganizationRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;

pub struct DepartmentService<D: DepartmentRepository, O: OrganizationRepository> {
    departments: D,
    organizations: O,
}

impl<D: DepartmentRepository, O: OrganizationRepository> DepartmentService<D, O> {
    pub fn new(departments: D, organizations: O) -> Self {
        Self {
            departments,
            organizations,
        }
    }

    /// Adds `user` to each named department of their organization,
    /// creating departments that do not exist yet.
    ///
    /// Names are trimmed and title-cased; lookup is by the slug of the
    /// cleaned name, so `" human resources"` and `"Human Resources"` land in
    /// the same department. Blank names are skipped.
    pub fn add_departments(&self, user: &User, names: &[&str]) -> RepoResult<Vec<Department>> {
        let mut joined = Vec::with_capacity(names.len());
        for raw in names {
            let name = title_case(raw.trim());
            let slug = slugify(&name);
            if slug.is_empty() {
                continue;
            }

            let (department, created) = self
                .departments
                .get_or_create_department(user.organization_id, &slug, &name)?;
            self.departments.add_member(department.id, user.id)?;
            info!(
                "event=department_join module=department status=ok user={} department={} created={created}",
                user.id, department.id
            );
            joined.push(department);
        }
        Ok(joined)
    }

    /// Comma-joined `"{department} - {organization}"` labels.
    pub fn get_departments(&self, user: &User) -> RepoResult<String> {
        let departments = self.departments.list_user_departments(user.id)?;
        let mut labels = Vec::with_capacity(departments.len());
        for department in &departments {
            let organization = self
                .organizations
                .get_organization(department.organization_id)?
                .ok_or(RepoError::NotFound {
                    entity: "organization",
                    id: department.organization_id,
                })?;
            labels.push(department.label(&organization.name));
        }
        Ok(labels.join(","))
    }

    /// The user's first department by `(slug, id)`.
    pub fn department(&self, user: &User) -> RepoResult<Option<Department>> {
        Ok(self
            .departments
            .list_user_departments(user.id)?
            .into_iter()
            .next())
    }

    pub fn leave_department(&self, user: &User, department: &Department) -> RepoResult<()> {
        self.departments.remove_member(department.id, user.id)
    }
}
