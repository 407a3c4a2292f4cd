use axum::extract::State;
use axum::routing::get;
use axum::Router;

use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::dashboard::{channel_stats, channel_videos, ChannelStats, DashboardVideo};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard/stats", get(stats))
        .route("/dashboard/videos", get(videos))
}

async fn stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<ChannelStats>> {
    let conn = state.db.get()?;
    let stats = channel_stats(&conn, user.id())?;
    Ok(ApiResponse::ok(stats, "Channel stats fetched successfully"))
}

/// Every video of the caller's channel, drafts included.
async fn videos(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<DashboardVideo>>> {
    let conn = state.db.get()?;
    let videos = channel_videos(&conn, user.id())?;
    Ok(ApiResponse::ok(videos, "Channel videos fetched successfully"))
}
