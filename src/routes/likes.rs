use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use super::visible_video;
use crate::db::models::LikeTarget;
use crate::error::AppResult;
use crate::extractors::{parse_id, CurrentUser};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::like::liked_videos;
use crate::views::video::VideoCard;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/like/toggle/v/{video_id}", post(toggle_video_like))
        .route("/like/toggle/c/{comment_id}", post(toggle_comment_like))
        .route("/like/toggle/t/{tweet_id}", post(toggle_tweet_like))
        .route("/like/videos", get(list_liked_videos))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeState {
    is_liked: bool,
}

fn toggle(state: &AppState, user: &CurrentUser, target: LikeTarget<'_>) -> AppResult<ApiResponse<LikeState>> {
    let toggled = state.repos.likes.toggle(user.id(), target)?;
    let is_liked = toggled.is_added();
    let message = if is_liked {
        format!("{} liked", target.kind())
    } else {
        format!("{} unliked", target.kind())
    };
    Ok(ApiResponse::ok(LikeState { is_liked }, message))
}

async fn toggle_video_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<LikeState>> {
    let video_id = parse_id(&video_id, "video")?;
    visible_video(&state, video_id, Some(user.id()))?;
    toggle(&state, &user, LikeTarget::Video(video_id))
}

async fn toggle_comment_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(comment_id): Path<String>,
) -> AppResult<ApiResponse<LikeState>> {
    let comment_id = parse_id(&comment_id, "comment")?;
    let comment = state.repos.comments.find_by_id(comment_id)?;
    visible_video(&state, &comment.video, Some(user.id()))?;
    toggle(&state, &user, LikeTarget::Comment(comment_id))
}

async fn toggle_tweet_like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<LikeState>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    toggle(&state, &user, LikeTarget::Tweet(tweet_id))
}

async fn list_liked_videos(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<VideoCard>>> {
    let conn = state.db.get()?;
    let videos = liked_videos(&conn, user.id())?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
