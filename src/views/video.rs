use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::search::SearchQuery;
use super::{scalar, viewer_flag, OwnerSummary, Page, PageRequest, IS_SUBSCRIBED, SUBSCRIBER_COUNT};
use crate::db::models::Video;
use crate::repo::videos::video_from_row;
use crate::repo::{RepoError, RepoResult};

/// Video columns followed by owner summary columns.
pub(crate) const SELECT_CARD: &str = "SELECT v.id, v.owner_id, v.video_file, v.thumbnail, v.title,
        v.description, v.duration, v.views, v.is_published, v.created_at, v.updated_at,
        u.id, u.username, u.full_name, u.avatar
     FROM videos v JOIN users u ON u.id = v.owner_id";

/// Video fields without the bare owner id, for embedding in richer views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFields {
    pub id: String,
    pub video_file: String,
    pub thumbnail: String,
    pub title: String,
    pub description: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Video> for VideoFields {
    fn from(v: Video) -> Self {
        Self {
            id: v.id,
            video_file: v.video_file,
            thumbnail: v.thumbnail,
            title: v.title,
            description: v.description,
            duration: v.duration,
            views: v.views,
            is_published: v.is_published,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

/// A video with its owner's public summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoCard {
    #[serde(flatten)]
    pub video: VideoFields,
    pub owner: OwnerSummary,
}

impl VideoCard {
    /// Reads a `SELECT_CARD` row.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            video: video_from_row(row)?.into(),
            owner: OwnerSummary::from_row(row, 11)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailOwner {
    #[serde(flatten)]
    pub summary: OwnerSummary,
    pub subscribers_count: i64,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: VideoFields,
    pub owner: DetailOwner,
    pub likes_count: i64,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    Views,
    Duration,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VideoFilter {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub sort_by: SortBy,
    pub sort_type: SortOrder,
}

fn order_clause(sort_by: SortBy, order: SortOrder) -> String {
    let dir = order.sql();
    match sort_by {
        SortBy::CreatedAt => format!("v.created_at {dir}, v.rowid {dir}"),
        SortBy::Views => format!("v.views {dir}, v.created_at DESC, v.rowid DESC"),
        SortBy::Duration => format!("v.duration {dir}, v.created_at DESC, v.rowid DESC"),
        SortBy::Title => {
            format!("v.title COLLATE NOCASE {dir}, v.created_at DESC, v.rowid DESC")
        }
    }
}

/// Published videos, optionally narrowed to one owner and a search query.
///
/// The owner's unpublished videos are included only when the viewer is that
/// owner. With a searchable query, rows are ranked by relevance and
/// `sort_by` is ignored.
pub fn list_videos(
    conn: &Connection,
    filter: &VideoFilter,
    viewer: Option<&str>,
    req: PageRequest,
) -> RepoResult<Page<VideoCard>> {
    let owner = filter.user_id.as_deref();
    let include_unpublished = viewer.is_some() && owner == viewer;
    let filter_sql = "WHERE (?1 IS NULL OR v.owner_id = ?1) AND (v.is_published = 1 OR ?2)";

    if let Some(search) = filter.query.as_deref().and_then(SearchQuery::parse) {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_CARD} {filter_sql} ORDER BY v.created_at DESC, v.rowid DESC"
        ))?;
        let mut scored = stmt
            .query_map(params![owner, include_unpublished], VideoCard::from_row)?
            .map(|card| card.map(|c| (search.score(&c.video.title, &c.video.description), c)))
            .collect::<Result<Vec<_>, _>>()?;
        scored.retain(|(score, _)| *score > 0.0);
        // Stable sort keeps recency order among equal scores.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let ranked = scored.into_iter().map(|(_, card)| card).collect();
        return Ok(Page::slice(ranked, req));
    }

    let total = scalar(
        conn,
        &format!("SELECT COUNT(*) FROM videos v {filter_sql}"),
        params![owner, include_unpublished],
    )?;
    let mut stmt = conn.prepare(&format!(
        "{SELECT_CARD} {filter_sql} ORDER BY {} LIMIT ?3 OFFSET ?4",
        order_clause(filter.sort_by, filter.sort_type)
    ))?;
    let docs = stmt
        .query_map(
            params![owner, include_unpublished, req.limit, req.offset()],
            VideoCard::from_row,
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Page::new(docs, total, req))
}

/// One video with owner, subscriber and like information for `viewer`.
/// Unpublished videos exist only for their owner.
pub fn video_detail(conn: &Connection, id: &str, viewer: Option<&str>) -> RepoResult<VideoDetail> {
    let card = conn
        .query_row(
            &format!("{SELECT_CARD} WHERE v.id = ?1"),
            [id],
            VideoCard::from_row,
        )
        .optional()?
        .ok_or(RepoError::NotFound("Video"))?;
    if !card.video.is_published && viewer != Some(card.owner.id.as_str()) {
        return Err(RepoError::NotFound("Video"));
    }

    let owner_id = card.owner.id.clone();
    let owner = DetailOwner {
        subscribers_count: scalar(conn, SUBSCRIBER_COUNT, [&owner_id])?,
        is_subscribed: viewer_flag(conn, IS_SUBSCRIBED, viewer, &owner_id)?,
        summary: card.owner,
    };
    Ok(VideoDetail {
        likes_count: scalar(conn, "SELECT COUNT(*) FROM likes WHERE video_id = ?1", [id])?,
        is_liked: viewer_flag(
            conn,
            "SELECT EXISTS(SELECT 1 FROM likes WHERE liked_by = ?1 AND video_id = ?2)",
            viewer,
            id,
        )?,
        video: card.video,
        owner,
    })
}
