use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{new_id, required, RepoError, RepoResult};
use crate::db::models::Video;
use crate::db::NOW;
use crate::state::DbPool;

pub(crate) const SELECT_VIDEO: &str = "SELECT v.id, v.owner_id, v.video_file, v.thumbnail, v.title,
        v.description, v.duration, v.views, v.is_published, v.created_at, v.updated_at
     FROM videos v";

#[derive(Debug, Clone)]
pub struct NewVideo<'a> {
    pub owner: &'a str,
    pub video_file: &'a str,
    pub thumbnail: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub duration: f64,
}

/// Partial update of a video's details; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct VideoPatch<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub thumbnail: Option<&'a str>,
}

#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// New videos start unpublished with zero views.
    pub fn create(&self, new: NewVideo<'_>) -> RepoResult<Video> {
        let title = required("title", new.title)?;
        let description = required("description", new.description)?;
        let video_file = required("videoFile", new.video_file)?;
        let thumbnail = required("thumbnail", new.thumbnail)?;

        let conn = self.pool.get()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO videos (id, owner_id, video_file, thumbnail, title, description, duration)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![id, new.owner, video_file, thumbnail, title, description, new.duration],
        )?;
        load(&conn, &id)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Video> {
        let conn = self.pool.get()?;
        load(&conn, id)
    }

    pub fn update(&self, id: &str, patch: VideoPatch<'_>) -> RepoResult<Video> {
        let title = patch.title.map(|t| required("title", t)).transpose()?;
        let description = patch
            .description
            .map(|d| required("description", d))
            .transpose()?;

        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!(
                "UPDATE videos SET
                    title = COALESCE(?1, title),
                    description = COALESCE(?2, description),
                    thumbnail = COALESCE(?3, thumbnail),
                    updated_at = {NOW}
                 WHERE id = ?4"
            ),
            params![title, description, patch.thumbnail, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound("Video"));
        }
        load(&conn, id)
    }

    pub fn toggle_publish(&self, id: &str) -> RepoResult<Video> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!(
                "UPDATE videos SET is_published = NOT is_published, updated_at = {NOW} WHERE id = ?1"
            ),
            [id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound("Video"));
        }
        load(&conn, id)
    }

    /// Add the video to the viewer's watch history. Views go up by one only
    /// when the entry is new. Returns whether it was counted.
    pub fn record_view(&self, viewer: &str, video_id: &str) -> RepoResult<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT OR IGNORE INTO watch_history (user_id, video_id) VALUES (?1, ?2)",
            params![viewer, video_id],
        )?;
        if inserted == 1 {
            tx.execute(
                "UPDATE videos SET views = views + 1 WHERE id = ?1",
                [video_id],
            )?;
        }

        tx.commit()?;
        Ok(inserted == 1)
    }

    /// Delete a video and everything that references it. Returns the deleted
    /// row so the caller can release its media.
    pub fn delete(&self, id: &str) -> RepoResult<Video> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let video = load(&tx, id)?;

        tx.execute(
            "DELETE FROM likes WHERE comment_id IN (SELECT id FROM comments WHERE video_id = ?1)",
            [id],
        )?;
        tx.execute("DELETE FROM likes WHERE video_id = ?1", [id])?;
        tx.execute("DELETE FROM comments WHERE video_id = ?1", [id])?;
        tx.execute("DELETE FROM playlist_videos WHERE video_id = ?1", [id])?;
        tx.execute("DELETE FROM watch_history WHERE video_id = ?1", [id])?;
        tx.execute("DELETE FROM videos WHERE id = ?1", [id])?;

        tx.commit()?;
        Ok(video)
    }
}

fn load(conn: &Connection, id: &str) -> RepoResult<Video> {
    conn.query_row(
        &format!("{SELECT_VIDEO} WHERE v.id = ?1"),
        [id],
        video_from_row,
    )
    .optional()?
    .ok_or(RepoError::NotFound("Video"))
}

/// Maps the first eleven columns in `SELECT_VIDEO` order.
pub(crate) fn video_from_row(row: &Row<'_>) -> rusqlite::Result<Video> {
    Ok(Video {
        id: row.get(0)?,
        owner: row.get(1)?,
        video_file: row.get(2)?,
        thumbnail: row.get(3)?,
        title: row.get(4)?,
        description: row.get(5)?,
        duration: row.get(6)?,
        views: row.get(7)?,
        is_published: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
