//! Mock platform implementation
//!
//! This module provides a configurable in-process stand-in for the upstream
//! posting service. It backs the local "mock" posting mode and the tests:
//! every upload and submission is recorded so call order and arguments can be
//! checked, and failures can be injected at a chosen call.
//!
//! The mock behaves like a strict upstream: it rejects posts over the
//! character limit, more than four images, unknown or reused media handles,
//! and replies to ids it never issued.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::PlatformError;
use crate::platforms::{Platform, PlatformResult};
use crate::types::{MediaHandle, PostId, MAX_IMAGES_PER_POST, MAX_POST_CHARS};

/// How an injected submission failure presents itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFailure {
    /// Transport-level failure (`SubmissionFailed`)
    Transport,
    /// Upstream validation failure (`SubmissionRejected`)
    Rejected,
}

/// One recorded `upload_media` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCall {
    pub mime_type: String,
    pub size: usize,
    /// Handle returned, `None` if the call failed
    pub handle: Option<MediaHandle>,
}

/// One recorded `submit` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCall {
    pub text: String,
    pub media: Vec<MediaHandle>,
    pub reply_to: Option<PostId>,
    /// Id returned, `None` if the call failed
    pub post_id: Option<PostId>,
}

/// Configuration for mock platform behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Platform name
    pub name: String,

    /// Delay before completing each call (simulates network latency)
    pub delay: Duration,

    /// Zero-based upload call that fails, if any
    pub fail_upload_at: Option<usize>,

    /// Zero-based submit call that fails, if any
    pub fail_submit_at: Option<usize>,

    /// Kind of the injected submit failure
    pub submit_failure: SubmitFailure,

    /// Character limit enforced on submit
    pub character_limit: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            delay: Duration::from_millis(0),
            fail_upload_at: None,
            fail_submit_at: None,
            submit_failure: SubmitFailure::Transport,
            character_limit: MAX_POST_CHARS,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    uploads: Vec<UploadCall>,
    submits: Vec<SubmitCall>,
    next_media_id: u64,
    next_post_id: u64,
    live_handles: HashSet<MediaHandle>,
    posted: HashSet<PostId>,
}

/// Mock platform for local runs and tests
///
/// Clones share the same call log, so a test can keep one clone for
/// inspection while the orchestrator owns another.
#[derive(Clone)]
pub struct MockPlatform {
    config: MockConfig,
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockPlatform {
    /// Create a new mock platform with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Create a mock platform that always succeeds
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Create a mock platform whose `index`-th upload fails
    pub fn upload_failure_at(name: &str, index: usize) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            fail_upload_at: Some(index),
            ..Default::default()
        })
    }

    /// Create a mock platform whose `index`-th submission fails
    pub fn submit_failure_at(name: &str, index: usize, failure: SubmitFailure) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            fail_submit_at: Some(index),
            submit_failure: failure,
            ..Default::default()
        })
    }

    /// Create a mock platform with a delay on every call
    pub fn with_delay(name: &str, delay: Duration) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            delay,
            ..Default::default()
        })
    }

    /// All upload calls so far, in call order
    pub fn upload_calls(&self) -> Vec<UploadCall> {
        lock(&self.state).uploads.clone()
    }

    /// All submit calls so far, in call order
    pub fn submit_calls(&self) -> Vec<SubmitCall> {
        lock(&self.state).submits.clone()
    }

    pub fn upload_call_count(&self) -> usize {
        lock(&self.state).uploads.len()
    }

    pub fn submit_call_count(&self) -> usize {
        lock(&self.state).submits.len()
    }

    /// Texts of successfully submitted posts, in order
    pub fn posted_texts(&self) -> Vec<String> {
        lock(&self.state)
            .submits
            .iter()
            .filter(|call| call.post_id.is_some())
            .map(|call| call.text.clone())
            .collect()
    }

    async fn simulate_latency(&self) {
        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }
    }

    fn check_submission(
        &self,
        state: &MockState,
        text: &str,
        media: &[MediaHandle],
        reply_to: Option<&PostId>,
    ) -> PlatformResult<()> {
        let chars = text.chars().count();
        if chars > self.config.character_limit {
            return Err(PlatformError::SubmissionRejected(format!(
                "Text exceeds {} character limit (got {} characters)",
                self.config.character_limit, chars
            )));
        }

        if media.len() > MAX_IMAGES_PER_POST {
            return Err(PlatformError::SubmissionRejected(format!(
                "At most {} media items per post (got {})",
                MAX_IMAGES_PER_POST,
                media.len()
            )));
        }

        if let Some(unknown) = media.iter().find(|h| !state.live_handles.contains(*h)) {
            return Err(PlatformError::SubmissionRejected(format!(
                "Unknown or already used media handle: {}",
                unknown
            )));
        }

        if let Some(parent) = reply_to {
            if !state.posted.contains(parent) {
                return Err(PlatformError::SubmissionRejected(format!(
                    "Reply target does not exist: {}",
                    parent
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn upload_media(&self, bytes: &[u8], mime_type: &str) -> PlatformResult<MediaHandle> {
        self.simulate_latency().await;

        let mut state = lock(&self.state);
        let call_index = state.uploads.len();

        let result = if self.config.fail_upload_at == Some(call_index) {
            Err(PlatformError::MediaUploadFailed(format!(
                "Mock upload {} failed",
                call_index
            )))
        } else {
            state.next_media_id += 1;
            let handle = MediaHandle::new(format!("mock-media-id-{}", state.next_media_id));
            state.live_handles.insert(handle.clone());
            Ok(handle)
        };

        state.uploads.push(UploadCall {
            mime_type: mime_type.to_string(),
            size: bytes.len(),
            handle: result.as_ref().ok().cloned(),
        });

        result
    }

    async fn submit(
        &self,
        text: &str,
        media: &[MediaHandle],
        reply_to: Option<&PostId>,
    ) -> PlatformResult<PostId> {
        self.simulate_latency().await;

        let mut state = lock(&self.state);
        let call_index = state.submits.len();

        let result = if self.config.fail_submit_at == Some(call_index) {
            Err(match self.config.submit_failure {
                SubmitFailure::Transport => {
                    PlatformError::SubmissionFailed(format!("Mock submit {} timed out", call_index))
                }
                SubmitFailure::Rejected => PlatformError::SubmissionRejected(format!(
                    "Mock submit {} rejected",
                    call_index
                )),
            })
        } else {
            self.check_submission(&state, text, media, reply_to)
                .map(|()| {
                    state.next_post_id += 1;
                    PostId::new(format!("mock-tweet-id-{}", state.next_post_id))
                })
        };

        if let Ok(post_id) = &result {
            for handle in media {
                state.live_handles.remove(handle);
            }
            state.posted.insert(post_id.clone());
        }

        state.submits.push(SubmitCall {
            text: text.to_string(),
            media: media.to_vec(),
            reply_to: reply_to.cloned(),
            post_id: result.as_ref().ok().cloned(),
        });

        result
    }

    fn character_limit(&self) -> Option<usize> {
        Some(self.config.character_limit)
    }
}
