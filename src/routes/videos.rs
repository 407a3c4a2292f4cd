use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::routing::{get, patch};
use axum::Router;
use serde::Deserialize;

use super::{discard, optional_text, required_text, swap_asset, upload};
use crate::db::models::Video;
use crate::error::{AppError, AppResult};
use crate::extractors::{ensure_owner, parse_id, CurrentUser, MaybeUser};
use crate::media::{MediaKind, MultipartForm};
use crate::repo::videos::{NewVideo, VideoPatch};
use crate::response::{ApiResponse, Empty};
use crate::state::AppState;
use crate::views::video::{list_videos, video_detail, SortBy, SortOrder, VideoCard, VideoDetail, VideoFilter};
use crate::views::{Page, PageParams, PageRequest, DEFAULT_LIMIT};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/video", get(list).post(publish))
        .route(
            "/video/v/{video_id}",
            get(get_video).patch(update_video).delete(delete_video),
        )
        .route("/video/toggle/publish/{video_id}", patch(toggle_publish))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    query: Option<String>,
    sort_by: Option<SortBy>,
    sort_type: Option<SortOrder>,
    user_id: Option<String>,
}

async fn list(
    State(state): State<AppState>,
    viewer: MaybeUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Page<VideoCard>>> {
    let Query(query) = query?;
    let req = PageRequest::new(
        PageParams {
            page: query.page,
            limit: query.limit,
        },
        DEFAULT_LIMIT,
    )?;
    let user_id = match optional_text(query.user_id.as_deref()) {
        Some(id) => Some(parse_id(id, "user")?.to_string()),
        None => None,
    };
    let filter = VideoFilter {
        query: query.query,
        user_id,
        sort_by: query.sort_by.unwrap_or_default(),
        sort_type: query.sort_type.unwrap_or_default(),
    };

    let conn = state.db.get()?;
    let page = list_videos(&conn, &filter, viewer.id(), req)?;
    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// Multipart publish: `title`, `description`, `videoFile` and `thumbnail`.
async fn publish(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> AppResult<ApiResponse<Video>> {
    let mut form = MultipartForm::read(multipart, &state.config.temp_path()).await?;
    let title = required_text(form.text("title"), "title")?.to_string();
    let description = required_text(form.text("description"), "description")?.to_string();
    let video_file = form.require_file("videoFile")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let video = upload(&state, &video_file, MediaKind::Video).await?;
    let thumbnail = match upload(&state, &thumbnail_file, MediaKind::Image).await {
        Ok(stored) => stored,
        Err(e) => {
            discard(&state, &[&video.url]).await;
            return Err(e);
        }
    };

    let created = state.repos.videos.create(NewVideo {
        owner: user.id(),
        video_file: &video.url,
        thumbnail: &thumbnail.url,
        title: &title,
        description: &description,
        duration: video.duration.unwrap_or(0.0),
    });
    match created {
        Ok(created) => {
            tracing::info!("User {} published video {}", user.0.username, created.id);
            Ok(ApiResponse::created(created, "Video uploaded successfully"))
        }
        Err(e) => {
            discard(&state, &[&video.url, &thumbnail.url]).await;
            Err(e.into())
        }
    }
}

/// Video detail. A signed-in viewer's first visit is recorded in their watch
/// history and counted as a view.
async fn get_video(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<VideoDetail>> {
    let video_id = parse_id(&video_id, "video")?;
    let mut detail = {
        let conn = state.db.get()?;
        video_detail(&conn, video_id, viewer.id())?
    };
    if let Some(viewer) = viewer.id() {
        if state.repos.videos.record_view(viewer, video_id)? {
            detail.video.views += 1;
        }
    }
    Ok(ApiResponse::ok(detail, "Video fetched successfully"))
}

/// Multipart edit of `title`, `description` and an optional new `thumbnail`.
async fn update_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(video_id): Path<String>,
    multipart: Multipart,
) -> AppResult<ApiResponse<Video>> {
    let video_id = parse_id(&video_id, "video")?;
    let existing = state.repos.videos.find_by_id(video_id)?;
    ensure_owner(&user, &existing.owner, "video")?;

    let mut form = MultipartForm::read(multipart, &state.config.temp_path()).await?;
    let title = optional_text(form.text("title")).map(str::to_string);
    let description = optional_text(form.text("description")).map(str::to_string);
    let thumbnail_file = form.take_file("thumbnail");
    if title.is_none() && description.is_none() && thumbnail_file.is_none() {
        return Err(AppError::validation(
            "At least one of title, description or thumbnail is required",
        ));
    }

    let save = |thumbnail: Option<&str>| {
        state.repos.videos.update(
            video_id,
            VideoPatch {
                title: title.as_deref(),
                description: description.as_deref(),
                thumbnail,
            },
        )
    };
    let updated = match &thumbnail_file {
        Some(file) => {
            let stored = upload(&state, file, MediaKind::Image).await?;
            swap_asset(
                state.media.as_ref(),
                &stored,
                Some(existing.thumbnail.as_str()),
                |url| save(Some(url)),
            )
            .await?
        }
        None => save(None)?,
    };
    Ok(ApiResponse::ok(updated, "Video updated successfully"))
}

/// Removes the video with its comments, likes, playlist entries and history,
/// then its stored files.
async fn delete_video(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<Empty>> {
    let video_id = parse_id(&video_id, "video")?;
    let existing = state.repos.videos.find_by_id(video_id)?;
    ensure_owner(&user, &existing.owner, "video")?;

    let deleted = state.repos.videos.delete(video_id)?;
    discard(&state, &[&deleted.video_file, &deleted.thumbnail]).await;
    tracing::info!("User {} deleted video {}", user.0.username, deleted.id);
    Ok(ApiResponse::ok(Empty {}, "Video deleted successfully"))
}

async fn toggle_publish(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(video_id): Path<String>,
) -> AppResult<ApiResponse<Video>> {
    let video_id = parse_id(&video_id, "video")?;
    let existing = state.repos.videos.find_by_id(video_id)?;
    ensure_owner(&user, &existing.owner, "video")?;

    let video = state.repos.videos.toggle_publish(video_id)?;
    Ok(ApiResponse::ok(video, "Publish status toggled successfully"))
}
