use axum::extract::Multipart;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;

use super::MediaError;
use crate::error::{AppError, AppResult};

/// An uploaded file spooled to disk. The file is removed when this is dropped,
/// whichever way the request ends.
#[derive(Debug)]
pub struct TempUpload {
    file: NamedTempFile,
    file_name: String,
    size: u64,
}

impl TempUpload {
    /// Empty temp file in `dir`, named with an extension that matches the upload.
    pub fn create(dir: &Path, file_name: &str, content_type: Option<&str>) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let suffix = format!(".{}", extension_for(file_name, content_type));
        let file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        Ok(Self {
            file,
            file_name: file_name.to_string(),
            size: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_bytes(dir: &Path, file_name: &str, bytes: &[u8]) -> io::Result<Self> {
        use std::io::Write;
        let mut upload = Self::create(dir, file_name, None)?;
        upload.file.write_all(bytes)?;
        upload.size = bytes.len() as u64;
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Name the client gave the file.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Extension from the client file name, else from the content type.
fn extension_for(file_name: &str, content_type: Option<&str>) -> String {
    let from_name = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()));
    if let Some(ext) = from_name {
        return ext.to_ascii_lowercase();
    }
    content_type
        .and_then(mime_guess::get_mime_extensions_str)
        .and_then(|exts| exts.first())
        .map(|e| e.to_string())
        .unwrap_or_else(|| "bin".to_string())
}

/// A multipart body: text fields in memory, file parts spooled to temp files.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, TempUpload>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart, temp_dir: &Path) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(mut field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let Some(file_name) = field.file_name().map(str::to_string) else {
                form.fields.insert(name, field.text().await?);
                continue;
            };

            let mut upload = TempUpload::create(temp_dir, &file_name, field.content_type())
                .map_err(MediaError::from)?;
            let mut out = tokio::fs::File::from_std(
                upload.file.as_file().try_clone().map_err(MediaError::from)?,
            );
            while let Some(chunk) = field.chunk().await? {
                out.write_all(&chunk).await.map_err(MediaError::from)?;
                upload.size += chunk.len() as u64;
            }
            out.flush().await.map_err(MediaError::from)?;

            // Browsers send an empty part when no file was picked.
            if upload.size > 0 {
                form.files.insert(name, upload);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<TempUpload> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> AppResult<TempUpload> {
        self.take_file(name)
            .ok_or_else(|| AppError::validation(format!("{name} file is required")))
    }
}
