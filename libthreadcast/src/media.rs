//! Media uploader
//!
//! Turns one [`MediaAttachment`] into a [`MediaHandle`]: resolve the source to
//! bytes (fetching remote URLs, decoding `data:` URIs), then hand the bytes to
//! the platform. Client-local references such as `blob:` object URLs cannot
//! be resolved here and are refused before any network call.

use std::borrow::Cow;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use percent_encoding::percent_decode_str;
use tracing::debug;

use crate::error::PlatformError;
use crate::platforms::{Platform, PlatformResult};
use crate::types::{MediaAttachment, MediaHandle, MediaSource};

/// Uploads single attachments to a platform
#[derive(Clone)]
pub struct MediaUploader {
    platform: Arc<dyn Platform>,
    http: reqwest::Client,
}

impl MediaUploader {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self::with_client(platform, reqwest::Client::new())
    }

    /// Use a preconfigured HTTP client for remote fetches
    pub fn with_client(platform: Arc<dyn Platform>, http: reqwest::Client) -> Self {
        Self { platform, http }
    }

    /// Upload one attachment and return its handle
    ///
    /// # Errors
    ///
    /// - `InvalidMediaSource` for client-local references and empty content
    /// - `MediaFetchFailed` when a remote URL cannot be fetched
    /// - `MediaUploadFailed` when the platform refuses the upload
    pub async fn upload(&self, attachment: &MediaAttachment) -> PlatformResult<MediaHandle> {
        let bytes = self.resolve(&attachment.source).await?;

        debug!(
            "Uploading {} media ({} bytes) for post {}",
            attachment.kind,
            bytes.len(),
            attachment.target_post_index
        );

        self.platform
            .upload_media(&bytes, &attachment.mime_type)
            .await
    }

    /// Resolve a media source to its bytes
    pub async fn resolve<'a>(&self, source: &'a MediaSource) -> PlatformResult<Cow<'a, [u8]>> {
        let bytes = match source {
            MediaSource::Bytes(bytes) => Cow::Borrowed(bytes.as_slice()),
            MediaSource::Url(url) if url.starts_with("data:") => {
                let (_, bytes) = decode_data_uri(url)?;
                Cow::Owned(bytes)
            }
            MediaSource::Url(url) => Cow::Owned(self.fetch(url).await?),
            MediaSource::LocalRef(reference) => return Err(local_ref_error(reference)),
        };

        if bytes.is_empty() {
            return Err(PlatformError::InvalidMediaSource(
                "Media content is empty".to_string(),
            ));
        }

        Ok(bytes)
    }

    async fn fetch(&self, url: &str) -> PlatformResult<Vec<u8>> {
        debug!("Fetching remote media from {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| PlatformError::MediaFetchFailed {
                status: None,
                message: format!("{}: {}", url, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::MediaFetchFailed {
                status: Some(status.as_u16()),
                message: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PlatformError::MediaFetchFailed {
                status: Some(status.as_u16()),
                message: format!("{}: failed to read body: {}", url, e),
            })?;

        Ok(body.to_vec())
    }
}

/// Reject sources that can never be resolved, without any I/O
///
/// Covers client-local references and empty byte buffers.
pub fn check_source(source: &MediaSource) -> PlatformResult<()> {
    match source {
        MediaSource::LocalRef(reference) => Err(local_ref_error(reference)),
        MediaSource::Bytes(bytes) if bytes.is_empty() => Err(PlatformError::InvalidMediaSource(
            "Media content is empty".to_string(),
        )),
        _ => Ok(()),
    }
}

fn local_ref_error(reference: &str) -> PlatformError {
    PlatformError::InvalidMediaSource(format!(
        "'{}' only exists on the client; send the file content instead",
        reference
    ))
}

/// Decode a `data:` URI into its MIME type and bytes
///
/// A missing MIME type defaults to `text/plain` as in RFC 2397.
pub fn decode_data_uri(uri: &str) -> PlatformResult<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| PlatformError::InvalidMediaSource("Not a data URI".to_string()))?;
    let (header, payload) = rest.split_once(',').ok_or_else(|| {
        PlatformError::InvalidMediaSource("Malformed data URI: missing ','".to_string())
    })?;

    let is_base64 = header.ends_with(";base64");
    let mime = header.trim_end_matches(";base64");
    let mime = if mime.is_empty() { "text/plain" } else { mime };

    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| PlatformError::InvalidMediaSource(format!("Invalid base64 data: {}", e)))?
    } else {
        percent_decode_str(payload).collect()
    };

    Ok((mime.to_string(), bytes))
}
