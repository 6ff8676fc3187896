//! Thread posting service
//!
//! Accepts editor-shaped requests (post texts plus media descriptors), turns
//! them into a validated [`Thread`] and runs the [`ThreadPoster`] with a
//! caller-side timeout.

use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PlatformError, Result, ThreadError, ThreadcastError};
use crate::media::{decode_data_uri, MediaUploader};
use crate::platforms::Platform;
use crate::poster::ThreadPoster;
use crate::service::events::EventBus;
use crate::types::{MediaAttachment, MediaKind, MediaSource, PostId, Thread, ThreadOutcome};

/// How a media descriptor carries its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSourceType {
    /// Content inline as base64 in `data`
    File,
    /// Content at `url`
    Url,
}

/// Media item as sent by the editor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub source_type: MediaSourceType,
    pub mime_type: String,
    pub target_post_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
}

impl MediaDescriptor {
    /// Inline file content (base64 in `data`)
    pub fn file(bytes: &[u8], mime_type: impl Into<String>, target_post_index: usize) -> Self {
        Self {
            source_type: MediaSourceType::File,
            mime_type: mime_type.into(),
            target_post_index,
            data: Some(STANDARD.encode(bytes)),
            url: None,
            kind: None,
        }
    }

    pub fn url(url: impl Into<String>, mime_type: impl Into<String>, target_post_index: usize) -> Self {
        Self {
            source_type: MediaSourceType::Url,
            mime_type: mime_type.into(),
            target_post_index,
            data: None,
            url: Some(url.into()),
            kind: None,
        }
    }

    /// Convert to an attachment, decoding inline content
    ///
    /// `data` may be plain base64 or a full `data:` URI.
    pub fn into_attachment(self) -> std::result::Result<MediaAttachment, PlatformError> {
        let index = self.target_post_index;
        let source = match self.source_type {
            MediaSourceType::File => {
                let data = self.data.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
                    PlatformError::InvalidMediaSource(format!(
                        "File media for post {} has no data",
                        index
                    ))
                })?;
                let bytes = if data.starts_with("data:") {
                    decode_data_uri(&data)?.1
                } else {
                    STANDARD.decode(data.trim()).map_err(|e| {
                        PlatformError::InvalidMediaSource(format!(
                            "File media for post {} is not valid base64: {}",
                            index, e
                        ))
                    })?
                };
                MediaSource::Bytes(bytes)
            }
            MediaSourceType::Url => {
                let url = self.url.filter(|u| !u.trim().is_empty()).ok_or_else(|| {
                    PlatformError::InvalidMediaSource(format!(
                        "URL media for post {} has no url",
                        index
                    ))
                })?;
                MediaSource::from_url(url)
            }
        };

        let attachment = MediaAttachment::new(source, self.mime_type, index);
        Ok(match self.kind {
            Some(kind) => attachment.with_kind(kind),
            None => attachment,
        })
    }
}

/// Body of a thread posting request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostThreadRequest {
    #[serde(default, alias = "tweets")]
    pub posts: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaDescriptor>,
}

impl PostThreadRequest {
    /// Validate into a [`Thread`]
    ///
    /// # Errors
    ///
    /// Returns a validation-step [`ThreadError`] for an empty thread, blank
    /// posts, undecodable media and media targeting a missing post.
    pub fn into_thread(self) -> std::result::Result<Thread, ThreadError> {
        if self.posts.is_empty() {
            return Err(ThreadError::validation(
                PlatformError::InvalidInput("Tweets are required".to_string()),
                0,
            ));
        }

        let mut attachments = Vec::with_capacity(self.media.len());
        for descriptor in self.media {
            let index = descriptor.target_post_index;
            let attachment = descriptor
                .into_attachment()
                .map_err(|kind| ThreadError::validation(kind, index))?;
            attachments.push(attachment);
        }

        Thread::new(self.posts, attachments)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostThreadResponse {
    pub success: bool,
    pub post_ids: Vec<PostId>,
}

/// Posts threads through the configured platform
#[derive(Clone)]
pub struct PostingService {
    poster: ThreadPoster,
    timeout: Duration,
}

impl PostingService {
    pub fn new(
        platform: Arc<dyn Platform>,
        uploader: MediaUploader,
        timeout: Duration,
        event_bus: EventBus,
    ) -> Self {
        Self {
            poster: ThreadPoster::from_parts(platform, uploader).with_events(event_bus),
            timeout,
        }
    }

    pub fn platform_name(&self) -> &str {
        self.poster.platform_name()
    }

    /// Post an editor request
    ///
    /// # Errors
    ///
    /// See [`PostingService::post_thread`]; malformed requests fail before any
    /// network call.
    pub async fn post(&self, request: PostThreadRequest) -> Result<PostThreadResponse> {
        let thread = request.into_thread()?;
        let post_ids = self.post_thread(thread).await?;

        Ok(PostThreadResponse {
            success: true,
            post_ids,
        })
    }

    /// Post a thread, waiting at most the configured timeout
    ///
    /// The run itself is not cancelled by the timeout: it keeps going in the
    /// background and its outcome is still logged and emitted as events.
    ///
    /// # Errors
    ///
    /// - `ThreadcastError::Thread` with the failing step, index and the ids
    ///   already posted
    /// - `ThreadcastError::Timeout` when the run did not finish in time
    pub async fn post_thread(&self, thread: Thread) -> Result<ThreadOutcome> {
        let poster = self.poster.clone();
        let task = tokio::spawn(async move { poster.post_thread(thread).await });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(join_error)) => Err(ThreadcastError::Platform(
                PlatformError::SubmissionFailed(format!("Posting task aborted: {}", join_error)),
            )),
            Err(_) => {
                warn!(
                    "Stopped waiting for thread after {}s; posting continues in the background",
                    self.timeout.as_secs()
                );
                Err(ThreadcastError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}
