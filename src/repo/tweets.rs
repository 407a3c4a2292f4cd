use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{new_id, required, RepoError, RepoResult};
use crate::db::models::Tweet;
use crate::db::NOW;
use crate::state::DbPool;

#[derive(Clone)]
pub struct TweetRepository {
    pool: DbPool,
}

impl TweetRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, owner: &str, content: &str) -> RepoResult<Tweet> {
        let content = required("content", content)?;
        let conn = self.pool.get()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO tweets (id, owner_id, content) VALUES (?1, ?2, ?3)",
            params![id, owner, content],
        )?;
        load(&conn, &id)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Tweet> {
        let conn = self.pool.get()?;
        load(&conn, id)
    }

    pub fn update_content(&self, id: &str, content: &str) -> RepoResult<Tweet> {
        let content = required("content", content)?;
        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!("UPDATE tweets SET content = ?1, updated_at = {NOW} WHERE id = ?2"),
            params![content, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound("Tweet"));
        }
        load(&conn, id)
    }

    /// Deletes the tweet and the likes on it.
    pub fn delete(&self, id: &str) -> RepoResult<Tweet> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let tweet = load(&tx, id)?;
        tx.execute("DELETE FROM likes WHERE tweet_id = ?1", [id])?;
        tx.execute("DELETE FROM tweets WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(tweet)
    }
}

fn load(conn: &Connection, id: &str) -> RepoResult<Tweet> {
    conn.query_row(
        "SELECT id, owner_id, content, created_at, updated_at FROM tweets WHERE id = ?1",
        [id],
        |row| {
            Ok(Tweet {
                id: row.get(0)?,
                owner: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        },
    )
    .optional()?
    .ok_or(RepoError::NotFound("Tweet"))
}
