use rusqlite::{params, Connection};
use serde::Serialize;

use super::{owner_columns, scalar, OwnerSummary, Page, PageRequest};
use crate::repo::{exists, RepoError, RepoResult};

pub const DEFAULT_LIMIT: i64 = 15;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub content: String,
    pub video: String,
    pub created_at: String,
    pub updated_at: String,
    pub owner: OwnerSummary,
    pub likes_count: i64,
    pub is_liked: bool,
}

/// Comments on a video, newest first.
pub fn list_comments(
    conn: &Connection,
    video_id: &str,
    viewer: Option<&str>,
    req: PageRequest,
) -> RepoResult<Page<CommentView>> {
    if !exists(conn, "videos", video_id)? {
        return Err(RepoError::NotFound("Video"));
    }

    let total = scalar(
        conn,
        "SELECT COUNT(*) FROM comments WHERE video_id = ?1",
        [video_id],
    )?;
    let mut stmt = conn.prepare(&format!(
        "SELECT c.id, c.content, c.video_id, c.created_at, c.updated_at, {},
            (SELECT COUNT(*) FROM likes l WHERE l.comment_id = c.id),
            EXISTS(SELECT 1 FROM likes l WHERE l.comment_id = c.id AND l.liked_by = ?2)
         FROM comments c JOIN users u ON u.id = c.owner_id
         WHERE c.video_id = ?1
         ORDER BY c.created_at DESC, c.rowid DESC
         LIMIT ?3 OFFSET ?4",
        owner_columns("u")
    ))?;
    let docs = stmt
        .query_map(
            params![video_id, viewer, req.limit, req.offset()],
            |row| {
                Ok(CommentView {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    video: row.get(2)?,
                    created_at: row.get(3)?,
                    updated_at: row.get(4)?,
                    owner: OwnerSummary::from_row(row, 5)?,
                    likes_count: row.get(9)?,
                    is_liked: row.get(10)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(docs, total, req))
}
