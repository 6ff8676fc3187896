//! Error types for Threadcast

use serde::Serialize;
use thiserror::Error;

use crate::types::PostId;

pub type Result<T> = std::result::Result<T, ThreadcastError>;

#[derive(Error, Debug)]
pub enum ThreadcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Thread posting failed: {0}")]
    Thread(#[from] ThreadError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timed out after {0}s waiting for the thread to post")]
    Timeout(u64),
}

impl ThreadcastError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ThreadcastError::InvalidInput(_) => 3,
            ThreadcastError::Platform(e) if e.is_caller_error() => 3,
            ThreadcastError::Thread(e) if e.kind.is_caller_error() => 3,
            ThreadcastError::Config(_) => 2,
            ThreadcastError::Platform(_) => 1,
            ThreadcastError::Thread(_) => 1,
            ThreadcastError::Timeout(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

/// Failures of a single upstream operation (upload, submit, fetch, generate)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid media source: {0}")]
    InvalidMediaSource(String),

    #[error("Media fetch failed ({}): {message}", status_label(.status))]
    MediaFetchFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Media upload failed: {0}")]
    MediaUploadFailed(String),

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    #[error("Generation failed: {0}")]
    Generation(String),
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no response".to_string(),
    }
}

impl PlatformError {
    /// Stable name of the error kind, used in API error payloads
    pub fn kind(&self) -> &'static str {
        match self {
            PlatformError::InvalidInput(_) => "InvalidInput",
            PlatformError::InvalidMediaSource(_) => "InvalidMediaSource",
            PlatformError::MediaFetchFailed { .. } => "MediaFetchFailed",
            PlatformError::MediaUploadFailed(_) => "MediaUploadFailed",
            PlatformError::SubmissionFailed(_) => "SubmissionFailed",
            PlatformError::SubmissionRejected(_) => "SubmissionRejected",
            PlatformError::Generation(_) => "Generation",
        }
    }

    /// True when the caller sent something unusable and nothing reached the network
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            PlatformError::InvalidInput(_) | PlatformError::InvalidMediaSource(_)
        )
    }
}

/// Which stage of thread posting an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStep {
    /// Input checks before any network call
    Validate,
    /// Media upload fan-out
    Upload,
    /// Sequential post submission
    Submit,
}

impl std::fmt::Display for ThreadStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadStep::Validate => write!(f, "validate"),
            ThreadStep::Upload => write!(f, "upload"),
            ThreadStep::Submit => write!(f, "submit"),
        }
    }
}

/// Structured failure of a whole thread posting run
///
/// `index` is the post index the failing step was working on: the target post
/// of the failed attachment for uploads, the post being submitted for submits.
/// `posted` holds every id submitted before the failure; those posts remain
/// live upstream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{step} step failed at post {index} ({} already posted): {kind}", .posted.len())]
pub struct ThreadError {
    pub kind: PlatformError,
    pub step: ThreadStep,
    pub index: usize,
    pub posted: Vec<PostId>,
}

impl ThreadError {
    pub fn new(kind: PlatformError, step: ThreadStep, index: usize, posted: Vec<PostId>) -> Self {
        Self {
            kind,
            step,
            index,
            posted,
        }
    }

    /// Input rejected before anything was sent upstream
    pub fn validation(kind: PlatformError, index: usize) -> Self {
        Self::new(kind, ThreadStep::Validate, index, Vec::new())
    }
}
