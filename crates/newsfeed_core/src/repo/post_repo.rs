//! Post repository contract and SQLite implementation.
//!
//! # Invariants
//! - Query APIs accept only [`PostFilter`] trees; callers never pass SQL.
//! - Results are ordered by `created_at`, then insertion order.

use crate::model::post::{Post, PostId, SharedWith};
use crate::repo::post_filter::PostFilter;
use crate::repo::{bool_to_int, ensure_schema, parse_bool, parse_uuid, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const POST_SELECT_SQL: &str = "SELECT
    uuid,
    organization_uuid,
    created_by,
    content,
    priority,
    shared_with,
    created_at
FROM posts";

pub trait PostRepository {
    fn create_post(&self, post: &Post) -> RepoResult<PostId>;
    fn update_post(&self, post: &Post) -> RepoResult<()>;
    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>>;
    fn filter_posts(&self, filter: &PostFilter) -> RepoResult<Vec<Post>>;
    fn count_posts(&self, filter: &PostFilter) -> RepoResult<u64>;
    fn posts_exist(&self, filter: &PostFilter) -> RepoResult<bool>;
}

pub struct SqlitePostRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(
            conn,
            &[(
                "posts",
                &[
                    "uuid",
                    "organization_uuid",
                    "created_by",
                    "priority",
                    "shared_with",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&self, post: &Post) -> RepoResult<PostId> {
        self.conn.execute(
            "INSERT INTO posts (
                uuid,
                organization_uuid,
                created_by,
                content,
                priority,
                shared_with
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                post.id.to_string(),
                post.organization_id.to_string(),
                post.created_by.to_string(),
                post.content.as_str(),
                bool_to_int(post.priority),
                post.shared_with.as_db(),
            ],
        )?;
        Ok(post.id)
    }

    fn update_post(&self, post: &Post) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE posts
             SET
                content = ?1,
                priority = ?2,
                shared_with = ?3
             WHERE uuid = ?4;",
            params![
                post.content.as_str(),
                bool_to_int(post.priority),
                post.shared_with.as_db(),
                post.id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "post",
                id: post.id,
            });
        }
        Ok(())
    }

    fn get_post(&self, id: PostId) -> RepoResult<Option<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_post_row(row)?)),
            None => Ok(None),
        }
    }

    fn filter_posts(&self, filter: &PostFilter) -> RepoResult<Vec<Post>> {
        let mut binds: Vec<Value> = Vec::new();
        let predicate = filter.to_sql(&mut binds);
        let mut stmt = self.conn.prepare(&format!(
            "{POST_SELECT_SQL} WHERE {predicate} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(binds))?;

        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(row)?);
        }
        Ok(posts)
    }

    fn count_posts(&self, filter: &PostFilter) -> RepoResult<u64> {
        let mut binds: Vec<Value> = Vec::new();
        let predicate = filter.to_sql(&mut binds);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM posts WHERE {predicate};"),
            params_from_iter(binds),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn posts_exist(&self, filter: &PostFilter) -> RepoResult<bool> {
        let mut binds: Vec<Value> = Vec::new();
        let predicate = filter.to_sql(&mut binds);
        let exists: i64 = self.conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM posts WHERE {predicate});"),
            params_from_iter(binds),
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    let shared_with_text: String = row.get("shared_with")?;
    let shared_with = SharedWith::parse_db(&shared_with_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid shared_with value `{shared_with_text}` in posts.shared_with"
        ))
    })?;

    Ok(Post {
        id: parse_uuid(&row.get::<_, String>("uuid")?, "posts.uuid")?,
        organization_id: parse_uuid(
            &row.get::<_, String>("organization_uuid")?,
            "posts.organization_uuid",
        )?,
        created_by: parse_uuid(&row.get::<_, String>("created_by")?, "posts.created_by")?,
        content: row.get("content")?,
        priority: parse_bool(row.get("priority")?, "posts.priority")?,
        shared_with,
        created_at: row.get("created_at")?,
    })
}
