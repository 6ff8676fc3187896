//! Upstream posting services
//!
//! The [`Platform`] trait is the boundary to the service that hosts media and
//! posts. It offers exactly two network operations, media upload and single
//! post submission; everything above it (source resolution, thread
//! sequencing) lives in [`crate::media`], [`crate::submit`] and
//! [`crate::poster`].
//!
//! # Examples
//!
//! ```no_run
//! use libthreadcast::platforms::{mock::MockPlatform, Platform};
//!
//! # async fn example() -> Result<(), libthreadcast::error::PlatformError> {
//! let platform = MockPlatform::success("mock");
//! let handle = platform.upload_media(b"\x89PNG...", "image/png").await?;
//! let first = platform.submit("Hello", &[handle], None).await?;
//! let reply = platform.submit("Again", &[], Some(&first)).await?;
//! println!("{} <- {}", first, reply);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Config, PlatformKind};
use crate::credentials::XCredentials;
use crate::error::{PlatformError, Result};
use crate::types::{MediaHandle, PostId, MAX_IMAGES_PER_POST, MAX_POST_CHARS};

// Mock platform is available for all builds: it backs the local "mock" mode
// and the integration tests
pub mod mock;
pub mod oauth;
pub mod x;

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// Upstream posting service
#[async_trait]
pub trait Platform: Send + Sync {
    /// Lowercase identifier (e.g. "x", "mock")
    fn name(&self) -> &str;

    /// Upload one media item and return its handle
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::MediaUploadFailed` when the service is
    /// unreachable or refuses the content.
    async fn upload_media(&self, bytes: &[u8], mime_type: &str) -> PlatformResult<MediaHandle>;

    /// Create one post, optionally as a reply, and return its id
    ///
    /// The text is sent as-is. Limits on length and media count are the
    /// service's to enforce.
    ///
    /// # Errors
    ///
    /// - `PlatformError::SubmissionRejected` when the service refuses the post
    ///   (too long, too many media, unknown reply target)
    /// - `PlatformError::SubmissionFailed` on transport or server failure
    async fn submit(
        &self,
        text: &str,
        media: &[MediaHandle],
        reply_to: Option<&PostId>,
    ) -> PlatformResult<PostId>;

    /// Maximum post length the service accepts
    fn character_limit(&self) -> Option<usize> {
        Some(MAX_POST_CHARS)
    }

    /// Maximum number of still images per post
    fn max_images(&self) -> usize {
        MAX_IMAGES_PER_POST
    }
}

/// Build the platform selected in the configuration
///
/// # Errors
///
/// Returns a configuration error when the X platform is selected and any of
/// its credentials is missing from the environment.
pub fn create_platform(config: &Config) -> Result<Arc<dyn Platform>> {
    match config.posting.platform {
        PlatformKind::Mock => {
            let delay = Duration::from_millis(config.posting.mock_delay_ms);
            Ok(Arc::new(mock::MockPlatform::with_delay("mock", delay)))
        }
        PlatformKind::X => {
            let credentials = XCredentials::from_env()?;
            let client = x::XPlatform::new(&config.x, credentials)?;
            Ok(Arc::new(client))
        }
    }
}
