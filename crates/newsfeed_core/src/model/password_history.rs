//! Password history ledger entry.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// One previously used password, stored as a fixed-salt hash.
///
/// `id` is assigned by storage and grows monotonically, so it doubles as
/// insertion order when pruning the oldest entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHistoryEntry {
    pub id: i64,
    pub user_id: UserId,
    pub password_hash: String,
    pub created_at: i64,
}
