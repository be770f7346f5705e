//! Core business rules for the multi-tenant news feed.
//! This crate is the single source of truth for visibility, priority and
//! account-lifecycle invariants.

pub mod config;
pub mod db;
pub mod i18n;
pub mod logging;
pub mod model;
pub mod password;
pub mod repo;
pub mod service;

pub use config::{AccountConfig, ConfigError, CoreConfig, LoggingConfig};
pub use i18n::{MapCatalog, MessageCatalog, PassthroughCatalog};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::department::{Department, DepartmentId};
pub use model::organization::{Organization, OrganizationId};
pub use model::password_history::PasswordHistoryEntry;
pub use model::post::{Post, PostId, SharedWith, ValidationError};
pub use model::user::{OrganizationScoped, User, UserId};
pub use repo::department_repo::{DepartmentRepository, SqliteDepartmentRepository};
pub use repo::organization_repo::{OrganizationRepository, SqliteOrganizationRepository};
pub use repo::password_history_repo::{
    PasswordHistoryRepository, SqlitePasswordHistoryRepository,
};
pub use repo::post_filter::PostFilter;
pub use repo::post_repo::{PostRepository, SqlitePostRepository};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::AccountService;
pub use service::department_service::DepartmentService;
pub use service::post_service::{
    accessible_posts, validate_priority, PostService, PRIORITY_EXISTS_MESSAGE,
};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
