use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use super::{scalar, viewer_flag, IS_SUBSCRIBED, SUBSCRIBER_COUNT};
use crate::repo::{RepoError, RepoResult};

/// Public channel page for `/user/c/:username`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
    pub created_at: String,
}

pub fn channel_profile(
    conn: &Connection,
    username: &str,
    viewer: Option<&str>,
) -> RepoResult<ChannelProfile> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(RepoError::Validation("username is required".into()));
    }

    let mut profile = conn
        .query_row(
            "SELECT id, username, full_name, email, avatar, cover_image, created_at
             FROM users WHERE username = ?1",
            [&username],
            |row| {
                Ok(ChannelProfile {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    full_name: row.get(2)?,
                    email: row.get(3)?,
                    avatar: row.get(4)?,
                    cover_image: row.get(5)?,
                    created_at: row.get(6)?,
                    subscribers_count: 0,
                    channels_subscribed_to_count: 0,
                    is_subscribed: false,
                })
            },
        )
        .optional()?
        .ok_or(RepoError::NotFound("Channel"))?;

    profile.subscribers_count = scalar(conn, SUBSCRIBER_COUNT, [&profile.id])?;
    profile.channels_subscribed_to_count = scalar(
        conn,
        "SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = ?1",
        [&profile.id],
    )?;
    profile.is_subscribed = viewer_flag(conn, IS_SUBSCRIBED, viewer, &profile.id)?;
    Ok(profile)
}
