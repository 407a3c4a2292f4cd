use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{discard, optional_text, required_text, swap_asset, upload};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{get_cookie_value, REFRESH_COOKIE};
use crate::auth::TokenPair;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::media::{MediaKind, MultipartForm};
use crate::repo::users::NewUser;
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::channel::{channel_profile, ChannelProfile};
use crate::views::history::watch_history;
use crate::views::video::VideoCard;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/logout", post(logout))
        .route("/user/refresh-token", post(refresh_token))
        .route("/user/change-password", post(change_password))
        .route("/user/current-user", get(current_user))
        .route("/user/update-account", patch(update_account))
        .route("/user/avatar", patch(update_avatar))
        .route("/user/cover-image", patch(update_cover_image))
        .route("/user/c/{username}", get(channel))
        .route("/user/history", get(history))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    old_password: Option<String>,
    new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAccountRequest {
    full_name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginData {
    user: User,
    #[serde(flatten)]
    tokens: TokenPair,
}

fn hash(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

/// Multipart sign-up: text fields plus a required `avatar` and optional
/// `coverImage`.
async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut form = MultipartForm::read(multipart, &state.config.temp_path()).await?;

    let full_name = required_text(form.text("fullName"), "fullName")?.to_string();
    let username = required_text(form.text("username"), "username")?.to_string();
    let email = required_text(form.text("email"), "email")?.to_string();
    let password = required_text(form.text("password"), "password")?.to_string();
    if !email.contains('@') {
        return Err(AppError::validation("email is invalid"));
    }

    if state
        .repos
        .users
        .find_by_login(Some(&username), Some(&email))?
        .is_some()
    {
        return Err(AppError::Conflict(
            "User with email or username already exists".into(),
        ));
    }

    let avatar_file = form.require_file("avatar")?;
    let cover_file = form.take_file("coverImage");

    let avatar = upload(&state, &avatar_file, MediaKind::Image).await?;
    let cover = match &cover_file {
        Some(file) => match upload(&state, file, MediaKind::Image).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                discard(&state, &[&avatar.url]).await;
                return Err(e);
            }
        },
        None => None,
    };

    let created = hash(&password).and_then(|password_hash| {
        state
            .repos
            .users
            .create(NewUser {
                username: &username,
                email: &email,
                full_name: &full_name,
                password_hash: &password_hash,
                avatar: &avatar.url,
                cover_image: cover.as_ref().map(|c| c.url.as_str()),
            })
            .map_err(AppError::from)
    });

    match created {
        Ok(user) => {
            tracing::info!("Registered user {}", user.username);
            Ok(ApiResponse::created(user, "User registered successfully"))
        }
        Err(e) => {
            let mut urls = vec![avatar.url.as_str()];
            if let Some(cover) = &cover {
                urls.push(&cover.url);
            }
            discard(&state, &urls).await;
            Err(e)
        }
    }
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let username = optional_text(body.username.as_deref());
    let email = optional_text(body.email.as_deref());
    if username.is_none() && email.is_none() {
        return Err(AppError::validation("username or email is required"));
    }
    let password = required_text(body.password.as_deref(), "password")?;

    let user = state
        .repos
        .users
        .find_by_login(username, email)?
        .ok_or_else(|| AppError::not_found("User does not exist"))?;
    if !verify_password(password, &user.password_hash) {
        return Err(AppError::unauthenticated("Invalid user credentials"));
    }

    let tokens = state.sessions.issue(&user)?;
    let cookies = state.sessions.cookies(&tokens);
    tracing::info!("User {} logged in", user.username);
    Ok((
        AppendHeaders(cookies),
        ApiResponse::ok(LoginData { user, tokens }, "User logged in successfully"),
    ))
}

async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    state.sessions.revoke(user.id())?;
    Ok((
        AppendHeaders(state.sessions.clear_cookies()),
        ApiResponse::ok(Empty {}, "User logged out"),
    ))
}

/// Refresh token from the cookie, else from a JSON body.
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let from_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<RefreshRequest>(&body)
            .map_err(|e| AppError::validation(format!("Malformed JSON body: {e}")))?
            .refresh_token
    };
    let token = get_cookie_value(&headers, REFRESH_COOKIE)
        .map(str::to_string)
        .or(from_body)
        .ok_or_else(|| AppError::unauthenticated("Unauthorized request"))?;

    let (_user, tokens) = state.sessions.rotate(&token)?;
    Ok((
        AppendHeaders(state.sessions.cookies(&tokens)),
        ApiResponse::ok(tokens, "Access token refreshed"),
    ))
}

async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> AppResult<ApiResponse<Empty>> {
    let Json(body) = body?;
    let old_password = required_text(body.old_password.as_deref(), "oldPassword")?;
    let new_password = required_text(body.new_password.as_deref(), "newPassword")?;

    if !verify_password(old_password, &user.0.password_hash) {
        return Err(AppError::validation("Invalid old password"));
    }
    let password_hash = hash(new_password)?;
    state.repos.users.set_password_hash(user.id(), &password_hash)?;
    Ok(ApiResponse::ok(Empty {}, "Password changed successfully"))
}

async fn current_user(user: CurrentUser) -> ApiResponse<User> {
    ApiResponse::ok(user.0, "Current user fetched successfully")
}

async fn update_account(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<UpdateAccountRequest>, JsonRejection>,
) -> AppResult<ApiResponse<User>> {
    let Json(body) = body?;
    let full_name = required_text(body.full_name.as_deref(), "fullName")?;
    let email = required_text(body.email.as_deref(), "email")?;
    if !email.contains('@') {
        return Err(AppError::validation("email is invalid"));
    }
    let updated = state.repos.users.update_account(user.id(), full_name, email)?;
    Ok(ApiResponse::ok(updated, "Account details updated successfully"))
}

#[derive(Clone, Copy)]
enum Asset {
    Avatar,
    CoverImage,
}

impl Asset {
    fn field(self) -> &'static str {
        match self {
            Asset::Avatar => "avatar",
            Asset::CoverImage => "coverImage",
        }
    }
}

/// Upload the new image, point the user at it, then drop the old one.
async fn replace_asset(
    state: &AppState,
    user: &CurrentUser,
    multipart: Multipart,
    asset: Asset,
) -> AppResult<User> {
    let mut form = MultipartForm::read(multipart, &state.config.temp_path()).await?;
    let file = form.require_file(asset.field())?;
    let stored = upload(state, &file, MediaKind::Image).await?;

    let previous = match asset {
        Asset::Avatar => Some(user.0.avatar.as_str()),
        Asset::CoverImage => user.0.cover_image.as_deref(),
    };
    swap_asset(state.media.as_ref(), &stored, previous, |url| match asset {
        Asset::Avatar => state.repos.users.set_avatar(user.id(), url),
        Asset::CoverImage => state.repos.users.set_cover_image(user.id(), url),
    })
    .await
}

async fn update_avatar(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<ApiResponse<User>> {
    let updated = replace_asset(&state, &user, multipart, Asset::Avatar).await?;
    Ok(ApiResponse::ok(updated, "Avatar updated successfully"))
}

async fn update_cover_image(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<ApiResponse<User>> {
    let updated = replace_asset(&state, &user, multipart, Asset::CoverImage).await?;
    Ok(ApiResponse::ok(updated, "Cover image updated successfully"))
}

async fn channel(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let conn = state.db.get()?;
    let profile = channel_profile(&conn, &username, viewer.id())?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<VideoCard>>> {
    let conn = state.db.get()?;
    let videos = watch_history(&conn, user.id())?;
    Ok(ApiResponse::ok(videos, "Watch history fetched successfully"))
}
