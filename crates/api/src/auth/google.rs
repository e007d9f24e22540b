//! Google OAuth userinfo lookup.
//!
//! The browser completes the OAuth flow and hands us the access token; we
//! only resolve it to a profile.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Timeout for a single userinfo request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum GoogleError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Google rejected the token (expired, revoked, wrong audience).
    #[error("Google rejected the access token (HTTP {0})")]
    Rejected(u16),

    #[error("Google returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Google profile has no email address")]
    MissingEmail,
}

/// Profile fields we keep from the userinfo response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// Resolves a Google access token to the account's profile.
#[async_trait]
pub trait GoogleIdentity: Send + Sync {
    async fn user_info(&self, access_token: &str) -> Result<GoogleUserInfo, GoogleError>;
}

/// [`GoogleIdentity`] backed by the OAuth v3 userinfo endpoint.
pub struct HttpGoogleIdentity {
    client: reqwest::Client,
    userinfo_url: String,
}

impl HttpGoogleIdentity {
    pub fn new(userinfo_url: impl Into<String>) -> Result<Self, GoogleError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            userinfo_url: userinfo_url.into(),
        })
    }
}

#[async_trait]
impl GoogleIdentity for HttpGoogleIdentity {
    async fn user_info(&self, access_token: &str) -> Result<GoogleUserInfo, GoogleError> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(GoogleError::Rejected(status.as_u16()));
        }
        if !status.is_success() {
            return Err(GoogleError::HttpStatus(status.as_u16()));
        }

        let info: GoogleUserInfo = response.json().await?;
        if info.email.trim().is_empty() {
            return Err(GoogleError::MissingEmail);
        }
        Ok(info)
    }
}
