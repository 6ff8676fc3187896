//! Single-post submitter

use std::sync::Arc;

use tracing::debug;

use crate::error::PlatformError;
use crate::platforms::{Platform, PlatformResult};
use crate::types::{MediaHandle, PostId};

/// Submits one post, optionally as a reply, with already uploaded media
///
/// Only blank text is refused locally. Length and media-count limits are left
/// to the platform, whose refusal surfaces as `SubmissionRejected`. Failures
/// are never retried here.
#[derive(Clone)]
pub struct PostSubmitter {
    platform: Arc<dyn Platform>,
}

impl PostSubmitter {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    pub async fn submit(
        &self,
        text: &str,
        media: &[MediaHandle],
        reply_to: Option<&PostId>,
    ) -> PlatformResult<PostId> {
        if text.trim().is_empty() {
            return Err(PlatformError::InvalidInput(
                "Post text cannot be empty".to_string(),
            ));
        }

        debug!(
            "Submitting to {} ({} chars, {} media, reply_to: {:?})",
            self.platform.name(),
            text.chars().count(),
            media.len(),
            reply_to.map(PostId::as_str)
        );

        self.platform.submit(text, media, reply_to).await
    }
}
