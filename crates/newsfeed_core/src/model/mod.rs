//! Domain model for tenants, accounts and posts.
//!
//! # Responsibility
//! - Define the plain records shared by repositories and services.
//! - Hold the pure predicates that need no storage (permissions, naming).
//!
//! # Invariants
//! - Every record is identified by a stable UUID, except password-history
//!   entries whose integer id encodes insertion order.
//! - User deletion is a soft-delete flag, never row removal.

pub mod department;
pub mod organization;
pub mod password_history;
pub mod post;
pub mod text;
pub mod user;
