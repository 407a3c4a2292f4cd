use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{exists, new_id, required, RepoError, RepoResult};
use crate::db::models::Playlist;
use crate::db::NOW;
use crate::state::DbPool;

#[derive(Clone)]
pub struct PlaylistRepository {
    pool: DbPool,
}

impl PlaylistRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, owner: &str, name: &str, description: &str) -> RepoResult<Playlist> {
        let name = required("name", name)?;
        let conn = self.pool.get()?;
        let id = new_id();
        conn.execute(
            "INSERT INTO playlists (id, owner_id, name, description) VALUES (?1, ?2, ?3, ?4)",
            params![id, owner, name, description.trim()],
        )?;
        load(&conn, &id)
    }

    pub fn find_by_id(&self, id: &str) -> RepoResult<Playlist> {
        let conn = self.pool.get()?;
        load(&conn, id)
    }

    /// At least one of `name` or `description` must be given.
    pub fn update(
        &self,
        id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> RepoResult<Playlist> {
        if name.is_none() && description.is_none() {
            return Err(RepoError::Validation(
                "At least one of name or description is required".into(),
            ));
        }
        let name = name.map(|n| required("name", n)).transpose()?;
        let description = description.map(str::trim);

        let conn = self.pool.get()?;
        let changed = conn.execute(
            &format!(
                "UPDATE playlists SET
                    name = COALESCE(?1, name),
                    description = COALESCE(?2, description),
                    updated_at = {NOW}
                 WHERE id = ?3"
            ),
            params![name, description, id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound("Playlist"));
        }
        load(&conn, id)
    }

    /// Append a video. Adding one that is already present changes nothing.
    pub fn add_video(&self, id: &str, video_id: &str) -> RepoResult<Playlist> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, "playlists", id)? {
            return Err(RepoError::NotFound("Playlist"));
        }
        if !exists(&tx, "videos", video_id)? {
            return Err(RepoError::NotFound("Video"));
        }

        let added = tx.execute(
            "INSERT OR IGNORE INTO playlist_videos (playlist_id, video_id, position)
             SELECT ?1, ?2, COALESCE(MAX(position), 0) + 1
             FROM playlist_videos WHERE playlist_id = ?1",
            params![id, video_id],
        )?;
        if added > 0 {
            touch(&tx, id)?;
        }
        let playlist = load(&tx, id)?;
        tx.commit()?;
        Ok(playlist)
    }

    pub fn remove_video(&self, id: &str, video_id: &str) -> RepoResult<Playlist> {
        let conn = self.pool.get()?;
        if !exists(&conn, "playlists", id)? {
            return Err(RepoError::NotFound("Playlist"));
        }
        let removed = conn.execute(
            "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
            params![id, video_id],
        )?;
        if removed > 0 {
            touch(&conn, id)?;
        }
        load(&conn, id)
    }

    pub fn delete(&self, id: &str) -> RepoResult<Playlist> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let playlist = load(&tx, id)?;
        tx.execute("DELETE FROM playlist_videos WHERE playlist_id = ?1", [id])?;
        tx.execute("DELETE FROM playlists WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(playlist)
    }
}

fn touch(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("UPDATE playlists SET updated_at = {NOW} WHERE id = ?1"),
        [id],
    )
}

fn load(conn: &Connection, id: &str) -> RepoResult<Playlist> {
    let mut playlist = conn
        .query_row(
            "SELECT id, owner_id, name, description, created_at, updated_at
             FROM playlists WHERE id = ?1",
            [id],
            |row| {
                Ok(Playlist {
                    id: row.get(0)?,
                    owner: row.get(1)?,
                    name: row.get(2)?,
                    description: row.get(3)?,
                    videos: Vec::new(),
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?
        .ok_or(RepoError::NotFound("Playlist"))?;

    let mut stmt = conn.prepare(
        "SELECT video_id FROM playlist_videos WHERE playlist_id = ?1 ORDER BY position",
    )?;
    playlist.videos = stmt
        .query_map([id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(playlist)
}
