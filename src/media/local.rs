use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

use super::{MediaError, MediaKind, MediaStore, StoredMedia};

/// Keeps media on local disk under `<root>/<kind>/` and serves it at
/// `<public_url>/media/<kind>/<file>`.
pub struct LocalMediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: format!("{}/media/", public_url.trim_end_matches('/')),
        }
    }

    /// Path relative to the root for one of our URLs. Rejects anything that
    /// could escape the root.
    fn relative_path<'a>(&self, url: &'a str) -> Option<&'a Path> {
        let rel = Path::new(url.strip_prefix(&self.url_prefix)?);
        let safe = rel.components().count() == 2
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        safe.then_some(rel)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn upload(&self, path: &Path, kind: MediaKind) -> Result<StoredMedia, MediaError> {
        let dir = self.root.join(kind.as_str());
        tokio::fs::create_dir_all(&dir).await?;

        let id = uuid::Uuid::now_v7().to_string();
        let file_name = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.clone(),
        };
        tokio::fs::copy(path, dir.join(&file_name)).await?;

        Ok(StoredMedia {
            url: format!("{}{}/{}", self.url_prefix, kind.as_str(), file_name),
            public_id: format!("{}/{}", kind.as_str(), id),
            duration: None,
        })
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let rel = self
            .relative_path(url)
            .ok_or_else(|| MediaError::InvalidReference(url.to_string()))?;
        match tokio::fs::remove_file(self.root.join(rel)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn public_id(&self, url: &str) -> Option<String> {
        let rel = self.relative_path(url)?;
        let stem = rel.file_stem()?.to_str()?;
        let kind = rel.parent()?.to_str()?;
        Some(format!("{kind}/{stem}"))
    }
}
