use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::required_text;
use crate::db::models::Tweet;
use crate::error::AppResult;
use crate::extractors::{ensure_owner, parse_id, CurrentUser};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::tweet::{user_tweets, TweetView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tweet", post(create))
        .route("/tweet/user/{user_id}", get(list_for_user))
        .route("/tweet/{tweet_id}", patch(update).delete(remove))
}

#[derive(Debug, Deserialize)]
struct TweetBody {
    content: Option<String>,
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<TweetBody>, JsonRejection>,
) -> AppResult<ApiResponse<Tweet>> {
    let Json(body) = body?;
    let content = required_text(body.content.as_deref(), "content")?;
    let tweet = state.repos.tweets.create(user.id(), content)?;
    Ok(ApiResponse::created(tweet, "Tweet created successfully"))
}

async fn list_for_user(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<TweetView>>> {
    let user_id = parse_id(&user_id, "user")?;
    let conn = state.db.get()?;
    let tweets = user_tweets(&conn, user_id, Some(viewer.id()))?;
    Ok(ApiResponse::ok(tweets, "Tweets fetched successfully"))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tweet_id): Path<String>,
    body: Result<Json<TweetBody>, JsonRejection>,
) -> AppResult<ApiResponse<Tweet>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let Json(body) = body?;
    let content = required_text(body.content.as_deref(), "content")?;

    let existing = state.repos.tweets.find_by_id(tweet_id)?;
    ensure_owner(&user, &existing.owner, "tweet")?;
    let tweet = state.repos.tweets.update_content(tweet_id, content)?;
    Ok(ApiResponse::ok(tweet, "Tweet updated successfully"))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tweet_id): Path<String>,
) -> AppResult<ApiResponse<Empty>> {
    let tweet_id = parse_id(&tweet_id, "tweet")?;
    let existing = state.repos.tweets.find_by_id(tweet_id)?;
    ensure_owner(&user, &existing.owner, "tweet")?;
    state.repos.tweets.delete(tweet_id)?;
    Ok(ApiResponse::ok(Empty {}, "Tweet deleted successfully"))
}
