//! Thumbnail lookup against the storage service.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Timeout for a single thumbnail request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storage service returned a non-2xx status code.
    #[error("Storage service returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Expected a JSON response, got content type '{0}'")]
    NotJson(String),
}

/// Resolves the thumbnail URL for a storage path.
#[async_trait]
pub trait ThumbnailSource: Send + Sync {
    async fn thumbnail_url(&self, path: &str) -> Result<String, ThumbnailError>;
}

#[derive(Debug, Deserialize)]
struct ThumbnailResponse {
    url: String,
}

/// [`ThumbnailSource`] that asks the storage service over HTTP.
///
/// `GET {base_url}{path}` must answer `application/json` with a body of the
/// form `{"message": "...", "url": "..."}`.
pub struct HttpThumbnailSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpThumbnailSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ThumbnailError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ThumbnailSource for HttpThumbnailSource {
    async fn thumbnail_url(&self, path: &str) -> Result<String, ThumbnailError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThumbnailError::HttpStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("application/json") {
            return Err(ThumbnailError::NotJson(content_type));
        }

        let body: ThumbnailResponse = response.json().await?;
        tracing::debug!(path, thumbnail_url = %body.url, "Resolved thumbnail");
        Ok(body.url)
    }
}
