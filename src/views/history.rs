use rusqlite::Connection;

use super::video::{VideoCard, SELECT_CARD};
use crate::repo::RepoResult;

/// The user's watch history in the order videos were first watched.
pub fn watch_history(conn: &Connection, user: &str) -> RepoResult<Vec<VideoCard>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CARD}
         JOIN watch_history h ON h.video_id = v.id
         WHERE h.user_id = ?1 AND (v.is_published = 1 OR v.owner_id = ?1)
         ORDER BY h.watched_at, h.rowid"
    ))?;
    let videos = stmt
        .query_map([user], VideoCard::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(videos)
}
