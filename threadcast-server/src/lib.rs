//! HTTP API for the Threadcast editor
//!
//! Routes:
//! - `POST /api/generate` prompt → post drafts
//! - `POST /api/generate-image` prompt → image data URIs
//! - `POST /api/post-thread` posts + media → reply chain ids
//! - `POST /api/validate` live draft checks
//! - `GET /health`

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
