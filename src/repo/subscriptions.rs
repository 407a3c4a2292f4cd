use rusqlite::{params, TransactionBehavior};

use super::{exists, new_id, RepoError, RepoResult, Toggled};
use crate::state::DbPool;

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: DbPool,
}

impl SubscriptionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Subscribe `subscriber` to `channel`, or undo an existing subscription.
    pub fn toggle(&self, subscriber: &str, channel: &str) -> RepoResult<Toggled> {
        if subscriber == channel {
            return Err(RepoError::Validation(
                "You cannot subscribe to your own channel".into(),
            ));
        }

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, "users", channel)? {
            return Err(RepoError::NotFound("Channel"));
        }

        let removed = tx.execute(
            "DELETE FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
            params![subscriber, channel],
        )?;
        let outcome = if removed > 0 {
            Toggled::Removed
        } else {
            tx.execute(
                "INSERT INTO subscriptions (id, subscriber_id, channel_id) VALUES (?1, ?2, ?3)
                 ON CONFLICT (subscriber_id, channel_id) DO NOTHING",
                params![new_id(), subscriber, channel],
            )?;
            Toggled::Added
        };

        tx.commit()?;
        Ok(outcome)
    }

    pub fn is_subscribed(&self, subscriber: &str, channel: &str) -> RepoResult<bool> {
        let conn = self.pool.get()?;
        let found = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2)",
            params![subscriber, channel],
            |row| row.get(0),
        )?;
        Ok(found)
    }
}
