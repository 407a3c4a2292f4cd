use rusqlite::Connection;

use super::video::{VideoCard, SELECT_CARD};
use crate::repo::RepoResult;

/// Videos `user` liked, most recent like first. Other owners' unpublished
/// videos are left out.
pub fn liked_videos(conn: &Connection, user: &str) -> RepoResult<Vec<VideoCard>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CARD}
         JOIN likes l ON l.video_id = v.id
         WHERE l.liked_by = ?1 AND (v.is_published = 1 OR v.owner_id = ?1)
         ORDER BY l.created_at DESC, l.rowid DESC"
    ))?;
    let videos = stmt
        .query_map([user], VideoCard::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(videos)
}
