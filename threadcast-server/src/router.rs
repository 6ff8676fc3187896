use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.service.config().server.body_limit_bytes;

    let api = Router::new()
        .route("/api/generate", post(handlers::generate))
        .route("/api/generate-image", post(handlers::generate_image))
        .route("/api/post-thread", post(handlers::post_thread))
        // Path the editor used before threads had their own route
        .route("/api/post-tweet", post(handlers::post_thread))
        .route("/api/validate", post(handlers::validate));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(api)
        // Media arrives base64-inlined, so the limit replaces axum's 2MB default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
