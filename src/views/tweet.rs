use rusqlite::{params, Connection};
use serde::Serialize;

use super::{owner_columns, OwnerSummary};
use crate::repo::{exists, RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    pub id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerSummary,
    pub likes_count: i64,
    pub liked_by: Vec<String>,
    pub is_liked: bool,
}

/// A user's tweets, newest first.
pub fn user_tweets(conn: &Connection, user: &str, viewer: Option<&str>) -> RepoResult<Vec<TweetView>> {
    if !exists(conn, "users", user)? {
        return Err(RepoError::NotFound("User"));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT t.id, t.content, t.created_at, t.updated_at, {}
         FROM tweets t JOIN users u ON u.id = t.owner_id
         WHERE t.owner_id = ?1
         ORDER BY t.created_at DESC, t.rowid DESC",
        owner_columns("u")
    ))?;
    let tweets = stmt
        .query_map(params![user], |row| {
            Ok(TweetView {
                id: row.get(0)?,
                content: row.get(1)?,
                created_at: row.get(2)?,
                updated_at: row.get(3)?,
                owner: OwnerSummary::from_row(row, 4)?,
                likes_count: 0,
                liked_by: Vec::new(),
                is_liked: false,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut likers =
        conn.prepare("SELECT liked_by FROM likes WHERE tweet_id = ?1 ORDER BY created_at, rowid")?;
    tweets
        .into_iter()
        .map(|mut tweet| -> RepoResult<TweetView> {
            tweet.liked_by = likers
                .query_map([&tweet.id], |row| row.get(0))?
                .collect::<Result<Vec<String>, _>>()?;
            tweet.likes_count = tweet.liked_by.len() as i64;
            tweet.is_liked = viewer.is_some_and(|v| tweet.liked_by.iter().any(|id| id == v));
            Ok(tweet)
        })
        .collect()
}
