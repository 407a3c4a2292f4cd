use rusqlite::Connection;
use serde::Serialize;

use super::video::VideoFields;
use super::{scalar, SUBSCRIBER_COUNT};
use crate::repo::videos::{video_from_row, SELECT_VIDEO};
use crate::repo::RepoResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub total_subscribers: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_videos: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardVideo {
    #[serde(flatten)]
    pub video: VideoFields,
    pub likes_count: i64,
}

/// Totals across everything the channel owns, published or not.
pub fn channel_stats(conn: &Connection, owner: &str) -> RepoResult<ChannelStats> {
    let (total_videos, total_views) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?1",
        [owner],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    let total_likes = scalar(
        conn,
        "SELECT COUNT(*) FROM likes l JOIN videos v ON v.id = l.video_id WHERE v.owner_id = ?1",
        [owner],
    )?;
    Ok(ChannelStats {
        total_subscribers: scalar(conn, SUBSCRIBER_COUNT, [owner])?,
        total_views,
        total_likes,
        total_videos,
    })
}

/// Every video of the channel with its like count, newest first.
pub fn channel_videos(conn: &Connection, owner: &str) -> RepoResult<Vec<DashboardVideo>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_VIDEO}
         WHERE v.owner_id = ?1
         ORDER BY v.created_at DESC, v.rowid DESC"
    ))?;
    let videos = stmt
        .query_map([owner], video_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut likes = conn.prepare("SELECT COUNT(*) FROM likes WHERE video_id = ?1")?;
    videos
        .into_iter()
        .map(|video| -> RepoResult<DashboardVideo> {
            let likes_count = likes.query_row([&video.id], |row| row.get(0))?;
            Ok(DashboardVideo {
                video: video.into(),
                likes_count,
            })
        })
        .collect()
}
