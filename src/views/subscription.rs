use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;

use super::video::VideoFields;
use super::{owner_columns, OwnerSummary};
use crate::repo::videos::{video_from_row, SELECT_VIDEO};
use crate::repo::{exists, RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    #[serde(flatten)]
    pub user: OwnerSummary,
    pub subscribers_count: i64,
    /// Whether the channel follows this subscriber back.
    pub subscribed_to_subscriber: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    #[serde(flatten)]
    pub channel: OwnerSummary,
    pub latest_video: Option<VideoFields>,
}

pub fn channel_subscribers(conn: &Connection, channel: &str) -> RepoResult<Vec<Subscriber>> {
    if !exists(conn, "users", channel)? {
        return Err(RepoError::NotFound("Channel"));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {},
            (SELECT COUNT(*) FROM subscriptions c WHERE c.channel_id = u.id),
            EXISTS(SELECT 1 FROM subscriptions back
                   WHERE back.subscriber_id = ?1 AND back.channel_id = u.id)
         FROM subscriptions s JOIN users u ON u.id = s.subscriber_id
         WHERE s.channel_id = ?1
         ORDER BY s.created_at DESC, s.rowid DESC",
        owner_columns("u"),
    ))?;
    let subscribers = stmt
        .query_map([channel], |row| {
            Ok(Subscriber {
                user: OwnerSummary::from_row(row, 0)?,
                subscribers_count: row.get(4)?,
                subscribed_to_subscriber: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(subscribers)
}

/// Channels `subscriber` follows, each with its newest published video.
pub fn subscribed_channels(
    conn: &Connection,
    subscriber: &str,
) -> RepoResult<Vec<SubscribedChannel>> {
    if !exists(conn, "users", subscriber)? {
        return Err(RepoError::NotFound("User"));
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {}
         FROM subscriptions s JOIN users u ON u.id = s.channel_id
         WHERE s.subscriber_id = ?1
         ORDER BY s.created_at DESC, s.rowid DESC",
        owner_columns("u"),
    ))?;
    let channels = stmt
        .query_map([subscriber], |row| OwnerSummary::from_row(row, 0))?
        .collect::<Result<Vec<_>, _>>()?;

    let mut latest = conn.prepare(&format!(
        "{SELECT_VIDEO}
         WHERE v.owner_id = ?1 AND v.is_published = 1
         ORDER BY v.created_at DESC, v.rowid DESC
         LIMIT 1"
    ))?;
    channels
        .into_iter()
        .map(|channel| -> RepoResult<SubscribedChannel> {
            let latest_video = latest
                .query_row([&channel.id], video_from_row)
                .optional()?
                .map(VideoFields::from);
            Ok(SubscribedChannel {
                channel,
                latest_video,
            })
        })
        .collect()
}
