// Media storage: uploaded files go to an external host, rows keep the URL
pub mod cloudinary;
pub mod intake;
pub mod local;

use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, MediaProvider};

pub use cloudinary::CloudinaryStore;
pub use intake::{MultipartForm, TempUpload};
pub use local::LocalMediaStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Reference to an asset held by a media store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
    /// Seconds, when the host reports it (videos).
    pub duration: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media host rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Not a reference to this store: {0}")]
    InvalidReference(String),

    #[error("Media store is not configured: {0}")]
    NotConfigured(String),

    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store the file at `path` and return its reference.
    async fn upload(&self, path: &Path, kind: MediaKind) -> Result<StoredMedia, MediaError>;

    /// Remove the asset behind `url`.
    async fn delete(&self, url: &str) -> Result<(), MediaError>;

    /// The store's id for the asset behind `url`, if it is one of ours.
    fn public_id(&self, url: &str) -> Option<String>;
}

/// The store selected by `[media] provider`.
pub fn from_config(config: &Config) -> Result<Arc<dyn MediaStore>, MediaError> {
    match config.media.provider {
        MediaProvider::Local => Ok(Arc::new(LocalMediaStore::new(
            config.media_path(),
            &config.public_url(),
        ))),
        MediaProvider::Cloudinary => {
            let media = &config.media;
            match (&media.cloud_name, &media.api_key, &media.api_secret) {
                (Some(cloud), Some(key), Some(secret)) => {
                    Ok(Arc::new(CloudinaryStore::new(cloud, key, secret)))
                }
                _ => Err(MediaError::NotConfigured(
                    "cloudinary needs cloud_name, api_key and api_secret".into(),
                )),
            }
        }
    }
}

/// Upload a spooled file with a deadline. The temp file is left to its guard.
pub async fn upload_with_timeout(
    store: &dyn MediaStore,
    file: &TempUpload,
    kind: MediaKind,
    timeout: Duration,
) -> Result<StoredMedia, MediaError> {
    match tokio::time::timeout(timeout, store.upload(file.path(), kind)).await {
        Ok(result) => result,
        Err(_) => Err(MediaError::Timeout(timeout)),
    }
}

/// Delete an asset, logging instead of failing. URLs the store does not own
/// are left alone.
pub async fn delete_quietly(store: &dyn MediaStore, url: &str) {
    let Some(public_id) = store.public_id(url) else {
        tracing::debug!("Skipping delete of foreign media {}", url);
        return;
    };
    match store.delete(url).await {
        Ok(()) => tracing::debug!("Deleted media {}", public_id),
        Err(e) => tracing::warn!("Failed to delete media {}: {}", public_id, e),
    }
}
