use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{optional_text, required_text, visible_video};
use crate::db::models::Playlist;
use crate::error::AppResult;
use crate::extractors::{ensure_owner, parse_id, CurrentUser};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::playlist::{playlist_detail, user_playlists, PlaylistDetail, PlaylistSummary};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/playlist", post(create))
        .route("/playlist/user/{user_id}", get(list_for_user))
        .route(
            "/playlist/{playlist_id}",
            get(detail).patch(update).delete(remove),
        )
        .route("/playlist/add/{video_id}/{playlist_id}", patch(add_video))
        .route("/playlist/remove/{video_id}/{playlist_id}", patch(remove_video))
}

#[derive(Debug, Deserialize)]
struct PlaylistBody {
    name: Option<String>,
    description: Option<String>,
}

/// The playlist, if the caller owns it.
fn owned_playlist(state: &AppState, user: &CurrentUser, playlist_id: &str) -> AppResult<Playlist> {
    let playlist = state.repos.playlists.find_by_id(playlist_id)?;
    ensure_owner(user, &playlist.owner, "playlist")?;
    Ok(playlist)
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<PlaylistBody>, JsonRejection>,
) -> AppResult<ApiResponse<Playlist>> {
    let Json(body) = body?;
    let name = required_text(body.name.as_deref(), "name")?;
    let description = body.description.as_deref().unwrap_or_default();
    let playlist = state.repos.playlists.create(user.id(), name, description)?;
    Ok(ApiResponse::created(playlist, "Playlist created successfully"))
}

async fn list_for_user(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<PlaylistSummary>>> {
    let user_id = parse_id(&user_id, "user")?;
    let conn = state.db.get()?;
    let playlists = user_playlists(&conn, user_id, Some(viewer.id()))?;
    Ok(ApiResponse::ok(playlists, "User playlists fetched successfully"))
}

async fn detail(
    State(state): State<AppState>,
    viewer: CurrentUser,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<PlaylistDetail>> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let conn = state.db.get()?;
    let playlist = playlist_detail(&conn, playlist_id, Some(viewer.id()))?;
    Ok(ApiResponse::ok(playlist, "Playlist fetched successfully"))
}

/// Rename and/or re-describe; blank fields are treated as absent.
async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(playlist_id): Path<String>,
    body: Result<Json<PlaylistBody>, JsonRejection>,
) -> AppResult<ApiResponse<Playlist>> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let Json(body) = body?;
    owned_playlist(&state, &user, playlist_id)?;

    let playlist = state.repos.playlists.update(
        playlist_id,
        optional_text(body.name.as_deref()),
        optional_text(body.description.as_deref()),
    )?;
    Ok(ApiResponse::ok(playlist, "Playlist updated successfully"))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(playlist_id): Path<String>,
) -> AppResult<ApiResponse<Empty>> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, &user, playlist_id)?;
    state.repos.playlists.delete(playlist_id)?;
    Ok(ApiResponse::ok(Empty {}, "Playlist deleted successfully"))
}

async fn add_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Playlist>> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, &user, playlist_id)?;
    visible_video(&state, video_id, Some(user.id()))?;

    let playlist = state.repos.playlists.add_video(playlist_id, video_id)?;
    Ok(ApiResponse::ok(playlist, "Video added to playlist"))
}

async fn remove_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<Playlist>> {
    let video_id = parse_id(&video_id, "video")?;
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    owned_playlist(&state, &user, playlist_id)?;

    let playlist = state.repos.playlists.remove_video(playlist_id, video_id)?;
    Ok(ApiResponse::ok(playlist, "Video removed from playlist"))
}
