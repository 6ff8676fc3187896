use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use libthreadcast::{PlatformError, PostId, ThreadError, ThreadStep, ThreadcastError};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    /// A required backend (credential, generator) is not set up
    NotConfigured(String),
    Internal(String),
    /// Posting run stopped; carries the step context and already posted ids
    Thread(ThreadError),
    /// A single upstream operation outside a posting run failed
    Upstream(PlatformError),
    Timeout(u64),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotConfigured(msg) => write!(f, "Not configured: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Thread(e) => write!(f, "Thread failed: {}", e),
            ApiError::Upstream(e) => write!(f, "Upstream error: {}", e),
            ApiError::Timeout(secs) => write!(f, "Timed out after {}s", secs),
        }
    }
}

impl std::error::Error for ApiError {}

/// HTTP status for a failure kind
pub fn status_for(kind: &PlatformError) -> StatusCode {
    match kind {
        PlatformError::InvalidInput(_) | PlatformError::InvalidMediaSource(_) => {
            StatusCode::BAD_REQUEST
        }
        PlatformError::SubmissionRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlatformError::MediaFetchFailed { .. }
        | PlatformError::MediaUploadFailed(_)
        | PlatformError::SubmissionFailed(_) => StatusCode::BAD_GATEWAY,
        PlatformError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Caller-facing message: bare for input problems, full otherwise
fn message_for(kind: &PlatformError) -> String {
    match kind {
        PlatformError::InvalidInput(msg) | PlatformError::InvalidMediaSource(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn post_ids(ids: &[PostId]) -> Vec<&str> {
    ids.iter().map(PostId::as_str).collect()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::NotConfigured(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, json!({ "error": msg }))
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": msg })),
            ApiError::Thread(e) => {
                let mut body = json!({
                    "error": message_for(&e.kind),
                    "kind": e.kind.kind(),
                    "index": e.index,
                    "postIds": post_ids(&e.posted),
                });
                if e.step != ThreadStep::Validate {
                    body["step"] = json!(e.step);
                }
                (status_for(&e.kind), body)
            }
            ApiError::Upstream(kind) => (
                status_for(&kind),
                json!({
                    "error": message_for(&kind),
                    "kind": kind.kind(),
                    "postIds": [],
                }),
            ),
            ApiError::Timeout(secs) => (
                StatusCode::GATEWAY_TIMEOUT,
                json!({
                    "error": format!(
                        "Timed out after {}s; some posts may still be published",
                        secs
                    ),
                    "kind": "Timeout",
                    "postIds": [],
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl ApiError {
    /// A posting body that could not be decoded, reported like any other
    /// thread validation failure
    pub fn malformed_thread(rejection: JsonRejection) -> Self {
        ApiError::Thread(ThreadError::validation(
            PlatformError::InvalidInput(rejection.body_text()),
            0,
        ))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<ThreadcastError> for ApiError {
    fn from(err: ThreadcastError) -> Self {
        match err {
            ThreadcastError::Thread(e) => ApiError::Thread(e),
            ThreadcastError::Platform(e) => ApiError::Upstream(e),
            ThreadcastError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ThreadcastError::Config(e) => ApiError::NotConfigured(e.to_string()),
            ThreadcastError::Timeout(secs) => ApiError::Timeout(secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&PlatformError::InvalidMediaSource("blob".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&PlatformError::SubmissionRejected("dup".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&PlatformError::MediaFetchFailed {
                status: Some(404),
                message: "x".into()
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&PlatformError::SubmissionFailed("reset".into())),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_thread_error_response_status() {
        let err = ApiError::Thread(ThreadError::new(
            PlatformError::SubmissionFailed("reset".into()),
            ThreadStep::Submit,
            1,
            vec![PostId::new("1")],
        ));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);

        assert_eq!(
            ApiError::Timeout(120).into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_from_threadcast_error() {
        let err: ApiError = ThreadcastError::InvalidInput("Prompt is required".into()).into();
        assert!(matches!(err, ApiError::BadRequest(ref m) if m == "Prompt is required"));
    }
}
