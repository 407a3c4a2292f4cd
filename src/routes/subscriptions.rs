use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::error::AppResult;
use crate::extractors::{parse_id, CurrentUser};
use crate::response::ApiResponse;
use crate::state::AppState;
use crate::views::subscription::{
    channel_subscribers, subscribed_channels, SubscribedChannel, Subscriber,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/subscriptions/ch/{channel_id}",
            get(subscribers).post(toggle),
        )
        .route("/subscriptions/u/{subscriber_id}", get(subscribed_to))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionState {
    is_subscribed: bool,
}

async fn toggle(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<SubscriptionState>> {
    let channel_id = parse_id(&channel_id, "channel")?;
    let toggled = state.repos.subscriptions.toggle(user.id(), channel_id)?;
    let is_subscribed = toggled.is_added();
    let message = if is_subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(SubscriptionState { is_subscribed }, message))
}

async fn subscribers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(channel_id): Path<String>,
) -> AppResult<ApiResponse<Vec<Subscriber>>> {
    let channel_id = parse_id(&channel_id, "channel")?;
    let conn = state.db.get()?;
    let subscribers = channel_subscribers(&conn, channel_id)?;
    Ok(ApiResponse::ok(subscribers, "Subscribers fetched successfully"))
}

async fn subscribed_to(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(subscriber_id): Path<String>,
) -> AppResult<ApiResponse<Vec<SubscribedChannel>>> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;
    let conn = state.db.get()?;
    let channels = subscribed_channels(&conn, subscriber_id)?;
    Ok(ApiResponse::ok(channels, "Subscribed channels fetched successfully"))
}
