//! Password history ledger repository.
//!
//! # Invariants
//! - After `append_capped(.., limit)` a user has at most `limit` entries.
//! - Pruning always removes the lowest id (oldest) entry first.
//! - Prune and insert commit together or not at all.

use crate::model::password_history::PasswordHistoryEntry;
use crate::model::user::UserId;
use crate::repo::{ensure_schema, parse_uuid, RepoResult};
use log::debug;
use rusqlite::{params, Connection, Row};

pub trait PasswordHistoryRepository {
    /// Drops the oldest entries until fewer than `limit` remain, then stores
    /// `password_hash` as the newest entry.
    fn append_capped(&self, user_id: UserId, password_hash: &str, limit: u32) -> RepoResult<()>;
    fn count_for_user(&self, user_id: UserId) -> RepoResult<u64>;
    /// Oldest first.
    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<PasswordHistoryEntry>>;
    /// True if the user registered under `email` has an entry equal to
    /// `password_hash`.
    fn hash_used_by_email(&self, email: &str, password_hash: &str) -> RepoResult<bool>;
}

pub struct SqlitePasswordHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePasswordHistoryRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[
                ("password_history", &["id", "user_uuid", "password", "created_at"]),
                ("users", &["uuid", "email"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl PasswordHistoryRepository for SqlitePasswordHistoryRepository<'_> {
    fn append_capped(&self, user_id: UserId, password_hash: &str, limit: u32) -> RepoResult<()> {
        let user_key = user_id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let mut pruned = 0_u32;
        loop {
            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM password_history WHERE user_uuid = ?1;",
                [user_key.as_str()],
                |row| row.get(0),
            )?;
            if count < i64::from(limit) {
                break;
            }
            let deleted = tx.execute(
                "DELETE FROM password_history
                 WHERE id = (
                    SELECT id
                    FROM password_history
                    WHERE user_uuid = ?1
                    ORDER BY id ASC
                    LIMIT 1
                 );",
                [user_key.as_str()],
            )?;
            if deleted == 0 {
                break;
            }
            pruned += 1;
        }

        tx.execute(
            "INSERT INTO password_history (user_uuid, password) VALUES (?1, ?2);",
            params![user_key, password_hash],
        )?;
        tx.commit()?;

        debug!(
            "event=password_history_append module=repo status=ok user={user_id} pruned={pruned}"
        );
        Ok(())
    }

    fn count_for_user(&self, user_id: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM password_history WHERE user_uuid = ?1;",
            [user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn list_for_user(&self, user_id: UserId) -> RepoResult<Vec<PasswordHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_uuid, password, created_at
             FROM password_history
             WHERE user_uuid = ?1
             ORDER BY id ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn hash_used_by_email(&self, email: &str, password_hash: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM password_history h
                INNER JOIN users u ON u.uuid = h.user_uuid
                WHERE u.email = ?1
                  AND h.password = ?2
            );",
            params![email, password_hash],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<PasswordHistoryEntry> {
    Ok(PasswordHistoryEntry {
        id: row.get("id")?,
        user_id: parse_uuid(&row.get::<_, String>("user_uuid")?, "password_history.user_uuid")?,
        password_hash: row.get("password")?,
        created_at: row.get("created_at")?,
    })
}
