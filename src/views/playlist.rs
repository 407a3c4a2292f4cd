use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use super::video::VideoFields;
use super::{owner_columns, OwnerSummary};
use crate::repo::videos::{video_from_row, SELECT_VIDEO};
use crate::repo::{exists, RepoError, RepoResult};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerSummary,
    pub videos: Vec<VideoFields>,
    pub playlist_size: i64,
    pub total_views: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub playlist_size: i64,
    pub total_views: i64,
}

/// Videos of a playlist in playlist order. Drafts show only to their own
/// uploader, whoever owns the playlist.
fn visible_videos(
    conn: &Connection,
    playlist: &str,
    viewer: Option<&str>,
) -> RepoResult<Vec<VideoFields>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_VIDEO}
         JOIN playlist_videos pv ON pv.video_id = v.id
         WHERE pv.playlist_id = ?1 AND (v.is_published = 1 OR v.owner_id = ?2)
         ORDER BY pv.position"
    ))?;
    let videos = stmt
        .query_map(params![playlist, viewer], |row| {
            video_from_row(row).map(VideoFields::from)
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(videos)
}

fn totals(videos: &[VideoFields]) -> (i64, i64) {
    (videos.len() as i64, videos.iter().map(|v| v.views).sum())
}

pub fn playlist_detail(conn: &Connection, id: &str, viewer: Option<&str>) -> RepoResult<PlaylistDetail> {
    let mut detail = conn
        .query_row(
            &format!(
                "SELECT p.id, p.name, p.description, p.created_at, p.updated_at, {}
                 FROM playlists p JOIN users u ON u.id = p.owner_id
                 WHERE p.id = ?1",
                owner_columns("u")
            ),
            [id],
            |row| {
                Ok(PlaylistDetail {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    owner: OwnerSummary::from_row(row, 5)?,
                    videos: Vec::new(),
                    playlist_size: 0,
                    total_views: 0,
                })
            },
        )
        .optional()?
        .ok_or(RepoError::NotFound("Playlist"))?;

    detail.videos = visible_videos(conn, id, viewer)?;
    (detail.playlist_size, detail.total_views) = totals(&detail.videos);
    Ok(detail)
}

/// All playlists of `user`, newest first, sized by what `viewer` may see.
pub fn user_playlists(
    conn: &Connection,
    user: &str,
    viewer: Option<&str>,
) -> RepoResult<Vec<PlaylistSummary>> {
    if !exists(conn, "users", user)? {
        return Err(RepoError::NotFound("User"));
    }

    let mut stmt = conn.prepare(
        "SELECT id, name, description, created_at, updated_at
         FROM playlists WHERE owner_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;
    let rows = stmt
        .query_map([user], |row| {
            Ok(PlaylistSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
                playlist_size: 0,
                total_views: 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|mut summary| -> RepoResult<PlaylistSummary> {
            let videos = visible_videos(conn, &summary.id, viewer)?;
            (summary.playlist_size, summary.total_views) = totals(&videos);
            Ok(summary)
        })
        .collect()
}
