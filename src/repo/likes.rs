use rusqlite::{params, TransactionBehavior};

use super::{exists, new_id, RepoError, RepoResult, Toggled};
use crate::db::models::LikeTarget;
use crate::state::DbPool;

#[derive(Clone)]
pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Flip the user's like on `target`. The target must exist.
    ///
    /// Removes a matching like if there is one, otherwise inserts. The insert
    /// ignores conflicts, so a racing duplicate leaves a single row behind.
    pub fn toggle(&self, user: &str, target: LikeTarget<'_>) -> RepoResult<Toggled> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !exists(&tx, target.table(), target.id())? {
            return Err(RepoError::NotFound(target.kind()));
        }

        let column = target.column();
        let removed = tx.execute(
            &format!("DELETE FROM likes WHERE liked_by = ?1 AND {column} = ?2"),
            params![user, target.id()],
        )?;
        let outcome = if removed > 0 {
            Toggled::Removed
        } else {
            tx.execute(
                &format!("INSERT OR IGNORE INTO likes (id, liked_by, {column}) VALUES (?1, ?2, ?3)"),
                params![new_id(), user, target.id()],
            )?;
            Toggled::Added
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn exists(&self, user: &str, target: LikeTarget<'_>) -> RepoResult<bool> {
        let conn = self.pool.get()?;
        let column = target.column();
        let found = conn.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM likes WHERE liked_by = ?1 AND {column} = ?2)"),
            params![user, target.id()],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    pub fn count_for(&self, target: LikeTarget<'_>) -> RepoResult<i64> {
        let conn = self.pool.get()?;
        let column = target.column();
        let count = conn.query_row(
            &format!("SELECT COUNT(*) FROM likes WHERE {column} = ?1"),
            [target.id()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
