//! Threadcast - AI-assisted thread composer and poster
//!
//! This library posts ordered threads with attached media to a microblogging
//! service as a reply chain, and drafts posts and images with a generative
//! model. The server and CLI binaries are thin layers over
//! [`service::ThreadcastService`].

pub mod config;
pub mod credentials;
pub mod error;
pub mod generation;
pub mod logging;
pub mod media;
pub mod platforms;
pub mod poster;
pub mod service;
pub mod submit;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{PlatformError, Result, ThreadError, ThreadStep, ThreadcastError};
pub use poster::ThreadPoster;
pub use types::{MediaAttachment, MediaHandle, MediaKind, MediaSource, PostId, Thread, ThreadOutcome};
