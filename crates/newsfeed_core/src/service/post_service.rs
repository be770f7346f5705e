//! Post visibility and the priority-post guard.
//!
//! # Responsibility
//! - Resolve which posts a user may see inside an organization.
//! - Reject a second priority post inside one accessible set.
//!
//! # Invariants
//! - A user without departments sees only their own posts in the organization.
//! - A user with departments sees the organization's all-department posts
//!   plus every post written by a co-member. The co-member clause is not
//!   narrowed to the organization, so co-members' posts in other
//!   organizations are visible too.
//! - The priority guard is a read-then-decide check with no isolation from
//!   concurrent writers. Two co-members can both pass it and both insert.

use crate::i18n::{MessageCatalog, PassthroughCatalog};
use crate::model::organization::OrganizationId;
use crate::model::post::{Post, PostId, SharedWith, ValidationError};
use crate::model::user::UserId;
use crate::repo::department_repo::DepartmentRepository;
use crate::repo::post_filter::PostFilter;
use crate::repo::post_repo::PostRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::ServiceResult;
use log::{info, warn};

/// Source message for the duplicate priority rejection.
pub const PRIORITY_EXISTS_MESSAGE: &str =
    "Priority post already exists for user. Set priority to false.";
/// Field the priority rejection is keyed to.
pub const PRIORITY_FIELD: &str = "priority";

/// Builds the visibility filter for `user_id` in `organization_id`.
pub fn accessible_posts_filter<D: DepartmentRepository>(
    departments: &D,
    user_id: UserId,
    organization_id: OrganizationId,
) -> RepoResult<PostFilter> {
    let co_members = departments.co_member_ids(user_id)?;
    if co_members.is_empty() {
        return Ok(PostFilter::Organization(organization_id).and(PostFilter::CreatedBy(user_id)));
    }

    Ok(PostFilter::Organization(organization_id)
        .and(PostFilter::SharedWith(SharedWith::AllDepartments))
        .or(PostFilter::CreatedByIn(co_members)))
}

/// Posts `user_id` may see in `organization_id`. Ordering is whatever the
/// repository applies.
pub fn accessible_posts<D: DepartmentRepository, P: PostRepository>(
    departments: &D,
    posts: &P,
    user_id: UserId,
    organization_id: OrganizationId,
) -> RepoResult<Vec<Post>> {
    let filter = accessible_posts_filter(departments, user_id, organization_id)?;
    posts.filter_posts(&filter)
}

/// Fails with a `priority` validation error when `priority` is set and the
/// creator's accessible set already holds a priority post.
pub fn validate_priority<D: DepartmentRepository, P: PostRepository, C: MessageCatalog>(
    departments: &D,
    posts: &P,
    catalog: &C,
    created_by: UserId,
    organization_id: OrganizationId,
    priority: bool,
) -> ServiceResult<()> {
    if !priority {
        return Ok(());
    }

    let filter = accessible_posts_filter(departments, created_by, organization_id)?
        .and(PostFilter::Priority(true));
    if posts.posts_exist(&filter)? {
        warn!(
            "event=priority_rejected module=post status=error user={created_by} organization={organization_id}"
        );
        return Err(ValidationError::new(
            PRIORITY_FIELD,
            catalog.translate(PRIORITY_EXISTS_MESSAGE),
        )
        .into());
    }
    Ok(())
}

/// Use-case service for feed posts.
pub struct PostService<
    D: DepartmentRepository,
    P: PostRepository,
    C: MessageCatalog = PassthroughCatalog,
> {
    departments: D,
    posts: P,
    catalog: C,
}

impl<D: DepartmentRepository, P: PostRepository> PostService<D, P, PassthroughCatalog> {
    /// Creates a service that reports messages untranslated.
    pub fn new(departments: D, posts: P) -> Self {
        Self::with_catalog(departments, posts, PassthroughCatalog)
    }
}

impl<D: DepartmentRepository, P: PostRepository, C: MessageCatalog> PostService<D, P, C> {
    pub fn with_catalog(departments: D, posts: P, catalog: C) -> Self {
        Self {
            departments,
            posts,
            catalog,
        }
    }

    pub fn accessible_posts(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> RepoResult<Vec<Post>> {
        accessible_posts(&self.departments, &self.posts, user_id, organization_id)
    }

    pub fn validate_priority(
        &self,
        created_by: UserId,
        organization_id: OrganizationId,
        priority: bool,
    ) -> ServiceResult<()> {
        validate_priority(
            &self.departments,
            &self.posts,
            &self.catalog,
            created_by,
            organization_id,
            priority,
        )
    }

    /// Runs the priority guard, then inserts. Not atomic; see module docs.
    pub fn create_post(&self, post: &Post) -> ServiceResult<PostId> {
        self.validate_priority(post.created_by, post.organization_id, post.priority)?;
        let id = self.posts.create_post(post)?;
        info!(
            "event=post_create module=post status=ok post={id} organization={} priority={}",
            post.organization_id, post.priority
        );
        Ok(id)
    }

    /// Saves edits to an existing post. The priority guard only runs when
    /// the post is being promoted to priority, so a priority post can still
    /// be edited without tripping over itself.
    pub fn update_post(&self, post: &Post) -> ServiceResult<()> {
        let stored = self.posts.get_post(post.id)?.ok_or(RepoError::NotFound {
            entity: "post",
            id: post.id,
        })?;
        if post.priority && !stored.priority {
            self.validate_priority(stored.created_by, stored.organization_id, true)?;
        }
        self.posts.update_post(post)?;
        Ok(())
    }

    pub fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        self.posts.get_post(id)
    }
}
