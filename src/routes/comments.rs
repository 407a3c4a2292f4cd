use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Deserialize;

use super::{required_text, visible_video};
use crate::db::models::Comment;
use crate::error::AppResult;
use crate::extractors::{ensure_owner, parse_id, CurrentUser};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::comment::{self, list_comments, CommentView};
use crate::views::{Page, PageParams, PageRequest};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/comment/{video_id}", get(list).post(add))
        .route("/comment/c/{comment_id}", patch(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    content: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(video_id): Path<String>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> AppResult<ApiResponse<Page<CommentView>>> {
    let video_id = parse_id(&video_id, "video")?;
    let Query(params) = params?;
    let req = PageRequest::new(params, comment::DEFAULT_LIMIT)?;
    visible_video(&state, video_id, Some(user.id()))?;

    let conn = state.db.get()?;
    let page = list_comments(&conn, video_id, Some(user.id()), req)?;
    Ok(ApiResponse::ok(page, "Comments fetched successfully"))
}

async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(video_id): Path<String>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> AppResult<ApiResponse<Comment>> {
    let video_id = parse_id(&video_id, "video")?;
    let Json(body) = body?;
    let content = required_text(body.content.as_deref(), "content")?;
    visible_video(&state, video_id, Some(user.id()))?;

    let comment = state.repos.comments.create(video_id, user.id(), content)?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
    body: Result<Json<CommentBody>, JsonRejection>,
) -> AppResult<ApiResponse<Comment>> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let Json(body) = body?;
    let content = required_text(body.content.as_deref(), "content")?;

    let existing = state.repos.comments.find_by_id(comment_id)?;
    ensure_owner(&user, &existing.owner, "comment")?;
    let comment = state.repos.comments.update_content(comment_id, content)?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<Empty>> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let existing = state.repos.comments.find_by_id(comment_id)?;
    ensure_owner(&user, &existing.owner, "comment")?;
    state.repos.comments.delete(comment_id)?;
    Ok(ApiResponse::ok(Empty {}, "Comment deleted successfully"))
}
