use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{exists, new_id, required, RepoError, RepoResult};
use crate::db::models::Comment;
use crate::db::NOW;
use crate::state::DbPool;

const SELECT_COMMENT: &str =
    "SELECT id, video_id, owner_id, content, created_at, updated_at FROM comments";

#[derive(Clone)]
pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, video_id: &str, owner: &str, content: &str) -> RepoResult<Comment> {
        let content = required("content", content)?;
        let conn = self.pool.get()?;
        if !exists(&conn, "videos", video_id)? {
            return Err(RepoError::NotFound("Video"));
        }

        let id = new_id();
        conn.execute(
            "INSERT INTO comments (id, video_id, owner_id, content) VALUES (?1, ?2, ?3, ?4)",
            params![id, video_id, owner, content],
        )?;
        load(&conn, &id)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Comment> {
        let conn = self.pool.get()?;
        load(&conn, id)
    }

    pub fn update_content(&self, id: &str, content: &str) -> RepoResult<Comment> {
        let content = required("content", content)?;
        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!("UPDATE comments SET content = ?1, updated_at = {NOW} WHERE id = ?2"),
            params![content, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound("Comment"));
        }
        load(&conn, id)
    }

    /// Deletes the comment and the likes on it.
    pub fn delete(&self, id: &str) -> RepoResult<Comment> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let comment = load(&tx, id)?;
        tx.execute("DELETE FROM likes WHERE comment_id = ?1", [id])?;
        tx.execute("DELETE FROM comments WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(comment)
    }
}

fn load(conn: &Connection, id: &str) -> RepoResult<Comment> {
    conn.query_row(
        &format!("{SELECT_COMMENT} WHERE id = ?1"),
        [id],
        |row| {
            Ok(Comment {
                id: row.get(0)?,
                video: row.get(1)?,
                owner: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
                updated_at: row.get(5)?,
            })
        },
    )
    .optional()?
    .ok_or(RepoError::NotFound("Comment"))
}
