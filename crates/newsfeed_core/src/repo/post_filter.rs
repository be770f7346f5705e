//! Criteria algebra for post queries.
//!
//! Services describe which posts they want as a [`PostFilter`] tree; the
//! SQLite repository compiles it into a parameterized `WHERE` clause, and
//! [`PostFilter::matches`] evaluates the same tree in memory.
//!
//! # Invariants
//! - An empty `In` set or an empty `Or` matches nothing.
//! - An empty `And` matches everything.
//! - Compiled SQL never interpolates values; all operands are bound.

use crate::model::organization::OrganizationId;
use crate::model::post::{Post, SharedWith};
use crate::model::user::UserId;
use crate::repo::bool_to_int;
use rusqlite::types::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    Organization(OrganizationId),
    CreatedBy(UserId),
    CreatedByIn(Vec<UserId>),
    SharedWith(SharedWith),
    Priority(bool),
    And(Vec<PostFilter>),
    Or(Vec<PostFilter>),
}

impl PostFilter {
    /// Matches every post.
    pub fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Conjunction, flattening nested `And` on the left.
    pub fn and(self, other: PostFilter) -> Self {
        match self {
            Self::And(mut clauses) => {
                clauses.push(other);
                Self::And(clauses)
            }
            single => Self::And(vec![single, other]),
        }
    }

    /// Disjunction, flattening nested `Or` on the left.
    pub fn or(self, other: PostFilter) -> Self {
        match self {
            Self::Or(mut clauses) => {
                clauses.push(other);
                Self::Or(clauses)
            }
            single => Self::Or(vec![single, other]),
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        match self {
            Self::Organization(id) => post.organization_id == *id,
            Self::CreatedBy(id) => post.created_by == *id,
            Self::CreatedByIn(ids) => ids.contains(&post.created_by),
            Self::SharedWith(shared_with) => post.shared_with == *shared_with,
            Self::Priority(priority) => post.priority == *priority,
            Self::And(clauses) => clauses.iter().all(|clause| clause.matches(post)),
            Self::Or(clauses) => clauses.iter().any(|clause| clause.matches(post)),
        }
    }

    /// Renders this filter as a SQL boolean expression over the `posts`
    /// table, appending bound operands to `binds` in placeholder order.
    pub(crate) fn to_sql(&self, binds: &mut Vec<Value>) -> String {
        match self {
            Self::Organization(id) => {
                binds.push(Value::Text(id.to_string()));
                "organization_uuid = ?".to_string()
            }
            Self::CreatedBy(id) => {
                binds.push(Value::Text(id.to_string()));
                "created_by = ?".to_string()
            }
            Self::CreatedByIn(ids) if ids.is_empty() => "0 = 1".to_string(),
            Self::CreatedByIn(ids) => {
                binds.extend(ids.iter().map(|id| Value::Text(id.to_string())));
                let placeholders = vec!["?"; ids.len()].join(", ");
                format!("created_by IN ({placeholders})")
            }
            Self::SharedWith(shared_with) => {
                binds.push(Value::Text(shared_with.as_db().to_string()));
                "shared_with = ?".to_string()
            }
            Self::Priority(priority) => {
                binds.push(Value::Integer(bool_to_int(*priority)));
                "priority = ?".to_string()
            }
            Self::And(clauses) if clauses.is_empty() => "1 = 1".to_string(),
            Self::Or(clauses) if clauses.is_empty() => "0 = 1".to_string(),
            Self::And(clauses) => join_clauses(clauses, " AND ", binds),
            Self::Or(clauses) => join_clauses(clauses, " OR ", binds),
        }
    }
}

fn join_clauses(clauses: &[PostFilter], separator: &str, binds: &mut Vec<Value>) -> String {
    let parts: Vec<String> = clauses
        .iter()
        .map(|clause| format!("({})", clause.to_sql(binds)))
        .collect();
    parts.join(separator)
}
