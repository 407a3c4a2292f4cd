use async_trait::async_trait;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::path::Path;
use url::Url;

use super::{MediaError, MediaKind, MediaStore, StoredMedia};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Incoming transformation applied to uploaded videos: at most 720p, H.264.
pub const VIDEO_TRANSFORMATION: &str = "c_limit,w_1280,h_720,vc_h264";

/// Cloudinary upload API client. Requests are signed with the API secret.
pub struct CloudinaryStore {
    client: reqwest::Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryStore {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Signature over the alphabetically sorted request parameters.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let joined = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let mut hasher = Sha1::new();
        hasher.update(joined.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!("{API_BASE}/{}/{resource_type}/{action}", self.cloud_name)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MediaError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(MediaError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Resource type and public id from a delivery URL such as
/// `https://res.cloudinary.com/<cloud>/video/upload/v123/folder/name.mp4`.
pub fn parse_reference(url: &str) -> Option<(String, String)> {
    let url = Url::parse(url).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let upload_at = segments.iter().position(|s| *s == "upload")?;
    let resource_type = segments.get(upload_at.checked_sub(1)?)?;
    if !matches!(*resource_type, "image" | "video" | "raw") {
        return None;
    }

    let after_upload = &segments[upload_at + 1..];
    let is_version =
        |s: &str| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit());
    // The public id follows the version when there is one, otherwise any
    // leading transformation segments.
    let rest = match after_upload.iter().position(|s| is_version(s)) {
        Some(v) => &after_upload[v + 1..],
        None => {
            let skip = after_upload
                .iter()
                .take_while(|s| s.contains(','))
                .count();
            &after_upload[skip..]
        }
    };

    let (last, folders) = rest.split_last()?;
    let stem = match last.rsplit_once('.') {
        Some((stem, _ext)) => stem,
        None => last,
    };
    if stem.is_empty() {
        return None;
    }
    let mut public_id = folders.join("/");
    if !public_id.is_empty() {
        public_id.push('/');
    }
    public_id.push_str(stem);
    Some((resource_type.to_string(), public_id))
}

#[async_trait]
impl MediaStore for CloudinaryStore {
    async fn upload(&self, path: &Path, kind: MediaKind) -> Result<StoredMedia, MediaError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let mut params = vec![("timestamp", timestamp.as_str())];
        if kind == MediaKind::Video {
            params.push(("transformation", VIDEO_TRANSFORMATION));
        }
        let signature = self.sign(&params);

        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes).file_name(file_name))
            .text("api_key", self.api_key.clone())
            .text("signature", signature);
        for (key, value) in &params {
            form = form.text(key.to_string(), value.to_string());
        }

        let response = self
            .client
            .post(self.endpoint(kind.as_str(), "upload"))
            .multipart(form)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::check(response).await?.json().await?;

        Ok(StoredMedia {
            url: uploaded.secure_url,
            public_id: uploaded.public_id,
            duration: uploaded.duration,
        })
    }

    async fn delete(&self, url: &str) -> Result<(), MediaError> {
        let (resource_type, public_id) =
            parse_reference(url).ok_or_else(|| MediaError::InvalidReference(url.to_string()))?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let params = [
            ("public_id", public_id.as_str()),
            ("timestamp", timestamp.as_str()),
        ];
        let signature = self.sign(&params);

        let response = self
            .client
            .post(self.endpoint(&resource_type, "destroy"))
            .form(&[
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
                ("api_key", self.api_key.as_str()),
                ("signature", signature.as_str()),
            ])
            .send()
            .await?;
        Self::check(response).await?;
        tracing::debug!("Deleted {} {}", resource_type, public_id);
        Ok(())
    }

    fn public_id(&self, url: &str) -> Option<String> {
        parse_reference(url).map(|(_, id)| id)
    }
}
