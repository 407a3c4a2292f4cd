// Read-only projections that join across tables
pub mod channel;
pub mod comment;
pub mod dashboard;
pub mod history;
pub mod like;
pub mod playlist;
pub mod search;
pub mod subscription;
pub mod tweet;
pub mod video;

use rusqlite::{Connection, Params, Row};
use serde::{Deserialize, Serialize};

use crate::repo::{RepoError, RepoResult};

/// Single integer result: counts and `EXISTS` checks.
pub(crate) fn scalar<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<i64> {
    conn.query_row(sql, params, |row| row.get(0))
}

/// `sql` takes `?1 = viewer, ?2 = target`. No viewer means false.
pub(crate) fn viewer_flag(
    conn: &Connection,
    sql: &str,
    viewer: Option<&str>,
    target: &str,
) -> rusqlite::Result<bool> {
    match viewer {
        Some(viewer) => Ok(scalar(conn, sql, [viewer, target])? != 0),
        None => Ok(false),
    }
}

pub(crate) const IS_SUBSCRIBED: &str =
    "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2)";
pub(crate) const SUBSCRIBER_COUNT: &str =
    "SELECT COUNT(*) FROM subscriptions WHERE channel_id = ?1";

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Raw `?page=&limit=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(params: PageParams, default_limit: i64) -> RepoResult<Self> {
        let page = params.page.unwrap_or(1);
        let limit = params.limit.unwrap_or(default_limit);
        if page < 1 {
            return Err(RepoError::Validation("page must be at least 1".into()));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(RepoError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// Rows to skip. Saturates so a huge page stays past the end.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub docs: Vec<T>,
    pub total_docs: i64,
    pub limit: i64,
    pub page: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    /// Wrap one already-windowed page of rows.
    pub fn new(docs: Vec<T>, total_docs: i64, req: PageRequest) -> Self {
        let total_pages = (total_docs + req.limit - 1) / req.limit;
        Self {
            docs,
            total_docs,
            limit: req.limit,
            page: req.page,
            total_pages,
            has_next_page: req.page < total_pages,
            has_prev_page: req.page > 1,
        }
    }

    /// Cut the requested window out of a fully materialized, ordered result.
    pub fn slice(all: Vec<T>, req: PageRequest) -> Self {
        let total = all.len() as i64;
        let docs = all
            .into_iter()
            .skip(req.offset() as usize)
            .take(req.limit as usize)
            .collect();
        Self::new(docs, total, req)
    }
}

/// Public fields of a user shown next to the things they own.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
}

/// Columns to select for `OwnerSummary::from_row`, given the users alias.
pub(crate) fn owner_columns(alias: &str) -> String {
    format!("{alias}.id, {alias}.username, {alias}.full_name, {alias}.avatar")
}

impl OwnerSummary {
    /// Reads the four `owner_columns` starting at `start`.
    pub(crate) fn from_row(row: &Row<'_>, start: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(start)?,
            username: row.get(start + 1)?,
            full_name: row.get(start + 2)?,
            avatar: row.get(start + 3)?,
        })
    }
}
