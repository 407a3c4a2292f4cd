pub mod comments;
pub mod dashboard;
pub mod healthcheck;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod tweets;
pub mod users;
pub mod videos;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::MediaProvider;
use crate::db::models::Video;
use crate::error::{AppError, AppResult};
use crate::media::{self, MediaKind, MediaStore, StoredMedia, TempUpload};
use crate::repo::{RepoError, RepoResult};
use crate::state::AppState;

/// The full application: JSON API under `/api/v1`, plus local media files
/// when the local store is in use.
pub fn app(state: AppState) -> anyhow::Result<Router> {
    let api = Router::new()
        .merge(healthcheck::router())
        .merge(users::router())
        .merge(videos::router())
        .merge(comments::router())
        .merge(likes::router())
        .merge(tweets::router())
        .merge(playlists::router())
        .merge(subscriptions::router())
        .merge(dashboard::router());

    let mut router = Router::new().nest("/api/v1", api);
    if state.config.media.provider == MediaProvider::Local {
        router = router.nest_service("/media", ServeDir::new(state.config.media_path()));
    }

    let mut router = router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(state.config.max_upload_bytes())),
    );

    if let Some(origin) = &state.config.server.cors_origin {
        let origin: HeaderValue = origin.parse()?;
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        );
    }

    Ok(router.with_state(state))
}

/// Upload one spooled file to the configured store.
pub(crate) async fn upload(
    state: &AppState,
    file: &TempUpload,
    kind: MediaKind,
) -> AppResult<StoredMedia> {
    let stored =
        media::upload_with_timeout(state.media.as_ref(), file, kind, state.config.upload_timeout())
            .await?;
    tracing::info!(
        "Stored {} ({} bytes) as {}",
        file.file_name(),
        file.size(),
        stored.public_id
    );
    Ok(stored)
}

/// Best-effort removal of assets that no longer back any row.
pub(crate) async fn discard(state: &AppState, urls: &[&str]) {
    for url in urls {
        media::delete_quietly(state.media.as_ref(), url).await;
    }
}

/// Point a row at a freshly stored asset through `persist`, then drop the
/// asset it replaced. If `persist` fails the new upload is dropped and the
/// old one kept.
pub(crate) async fn swap_asset<T>(
    store: &dyn MediaStore,
    stored: &StoredMedia,
    previous: Option<&str>,
    persist: impl FnOnce(&str) -> RepoResult<T>,
) -> AppResult<T> {
    match persist(&stored.url) {
        Ok(row) => {
            if let Some(previous) = previous.filter(|p| !p.is_empty()) {
                media::delete_quietly(store, previous).await;
            }
            Ok(row)
        }
        Err(e) => {
            media::delete_quietly(store, &stored.url).await;
            Err(e.into())
        }
    }
}

/// A video the caller may see: published, or their own.
pub(crate) fn visible_video(state: &AppState, id: &str, viewer: Option<&str>) -> AppResult<Video> {
    let video = state.repos.videos.find_by_id(id)?;
    if !video.is_published && viewer != Some(video.owner.as_str()) {
        return Err(RepoError::NotFound("Video").into());
    }
    Ok(video)
}

/// Required text field, trimmed.
pub(crate) fn required_text<'a>(value: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

/// Optional text field; blank counts as absent.
pub(crate) fn optional_text(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Mutex;

    use crate::media::MediaError;

    #[derive(Default)]
    struct RecordingStore {
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MediaStore for RecordingStore {
        async fn upload(&self, _path: &Path, _kind: MediaKind) -> Result<StoredMedia, MediaError> {
            Err(MediaError::NotConfigured("uploads unused".into()))
        }

        async fn delete(&self, url: &str) -> Result<(), MediaError> {
            self.deleted.lock().unwrap().push(url.to_string());
            Ok(())
        }

        fn public_id(&self, url: &str) -> Option<String> {
            url.strip_prefix("mem://").map(str::to_string)
        }
    }

    fn stored(url: &str) -> StoredMedia {
        StoredMedia {
            url: url.to_string(),
            public_id: url.trim_start_matches("mem://").to_string(),
            duration: None,
        }
    }

    #[tokio::test]
    async fn swap_asset_drops_old_after_persist() {
        let store = RecordingStore::default();
        let new = stored("mem://new.png");
        let saved = swap_asset(&store, &new, Some("mem://old.png"), |url| {
            Ok(url.to_string())
        })
        .await
        .unwrap();

        assert_eq!(saved, "mem://new.png");
        assert_eq!(*store.deleted.lock().unwrap(), vec!["mem://old.png"]);
    }

    #[tokio::test]
    async fn swap_asset_failure_drops_new_and_keeps_old() {
        let store = RecordingStore::default();
        let new = stored("mem://new.png");
        let result: AppResult<()> = swap_asset(&store, &new, Some("mem://old.png"), |_| {
            Err(RepoError::NotFound("User"))
        })
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(*store.deleted.lock().unwrap(), vec!["mem://new.png"]);
    }

    #[tokio::test]
    async fn swap_asset_without_previous_deletes_nothing() {
        let store = RecordingStore::default();
        let new = stored("mem://new.png");
        swap_asset(&store, &new, Some(""), |_| Ok(())).await.unwrap();
        swap_asset(&store, &new, None, |_| Ok(())).await.unwrap();
        assert!(store.deleted.lock().unwrap().is_empty());
    }

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text(Some("  hi "), "title").unwrap(), "hi");
        assert!(matches!(
            required_text(Some("   "), "title"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(required_text(None, "title"), Err(AppError::Validation(_))));
    }

    #[test]
    fn optional_text_drops_blank() {
        assert_eq!(optional_text(Some(" x ")), Some("x"));
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(None), None);
    }
}
