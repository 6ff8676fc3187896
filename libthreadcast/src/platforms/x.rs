//! X (Twitter) platform implementation
//!
//! Media goes through the v1.1 simple upload endpoint, posts through the v2
//! `POST /2/tweets` endpoint. Both are signed with OAuth 1.0a user-context
//! credentials.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::XConfig;
use crate::credentials::XCredentials;
use crate::error::{ConfigError, PlatformError, Result};
use crate::platforms::oauth::{authorization_header, Nonce};
use crate::platforms::{Platform, PlatformResult};
use crate::types::{MediaHandle, PostId};

/// X API client
pub struct XPlatform {
    client: Client,
    api_base: String,
    upload_base: String,
    credentials: XCredentials,
}

#[derive(Debug, Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    media: Option<TweetMedia>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<TweetReply>,
}

#[derive(Debug, Serialize)]
struct TweetMedia {
    media_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct TweetReply {
    in_reply_to_tweet_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MediaUploadResponse {
    media_id_string: String,
}

impl XPlatform {
    /// Create a new X client
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &XConfig, credentials: XCredentials) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            upload_base: config.upload_base.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn authorize(&self, url: &str) -> std::result::Result<String, String> {
        authorization_header(&self.credentials, "POST", url, &[], &Nonce::generate())
            .map_err(|e| format!("Failed to sign request: {}", e))
    }
}

#[async_trait]
impl Platform for XPlatform {
    fn name(&self) -> &str {
        "x"
    }

    async fn upload_media(&self, bytes: &[u8], mime_type: &str) -> PlatformResult<MediaHandle> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);
        let auth = self.authorize(&url).map_err(PlatformError::MediaUploadFailed)?;

        let part = Part::bytes(bytes.to_vec())
            .file_name("media")
            .mime_str(mime_type)
            .map_err(|e| {
                PlatformError::MediaUploadFailed(format!("Invalid MIME type '{}': {}", mime_type, e))
            })?;
        let form = Form::new().part("media", part);

        debug!("Uploading {} bytes ({}) to X", bytes.len(), mime_type);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PlatformError::MediaUploadFailed(format!("X media upload (transport): {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(PlatformError::MediaUploadFailed(format!(
                "X media upload returned {}: {}",
                status,
                error_detail(&body)
            )));
        }

        let parsed: MediaUploadResponse = serde_json::from_str(&body).map_err(|e| {
            PlatformError::MediaUploadFailed(format!("Unexpected X media upload response: {}", e))
        })?;

        Ok(MediaHandle::new(parsed.media_id_string))
    }

    async fn submit(
        &self,
        text: &str,
        media: &[MediaHandle],
        reply_to: Option<&PostId>,
    ) -> PlatformResult<PostId> {
        let url = format!("{}/2/tweets", self.api_base);
        let auth = self.authorize(&url).map_err(PlatformError::SubmissionFailed)?;

        let request = CreateTweet {
            text,
            media: (!media.is_empty()).then(|| TweetMedia {
                media_ids: media.iter().map(|h| h.as_str().to_string()).collect(),
            }),
            reply: reply_to.map(|parent| TweetReply {
                in_reply_to_tweet_id: parent.as_str().to_string(),
            }),
        };

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&request)
            .send()
            .await
            .map_err(|e| PlatformError::SubmissionFailed(format!("X post (transport): {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(map_submit_status(status, &body));
        }

        let parsed: CreateTweetResponse = serde_json::from_str(&body).map_err(|e| {
            PlatformError::SubmissionFailed(format!("Unexpected X post response: {}", e))
        })?;

        Ok(PostId::new(parsed.data.id))
    }
}

/// Map a non-success status of `POST /2/tweets` to an error kind
///
/// - 4xx → `SubmissionRejected` (validation, duplicates, bad reply target,
///   auth and rate limit refusals)
/// - anything else → `SubmissionFailed`
fn map_submit_status(status: StatusCode, body: &str) -> PlatformError {
    let detail = error_detail(body);
    if status.is_client_error() {
        PlatformError::SubmissionRejected(format!("X returned {}: {}", status, detail))
    } else {
        PlatformError::SubmissionFailed(format!("X returned {}: {}", status, detail))
    }
}

/// Pull the human-readable part out of an X error body
fn error_detail(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let candidates = [
            value.get("detail"),
            value.get("title"),
            value.pointer("/errors/0/message"),
            value.get("error"),
        ];
        if let Some(text) = candidates.into_iter().flatten().find_map(|v| v.as_str()) {
            return text.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}
