//! Route handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use libthreadcast::service::posting::{PostThreadRequest, PostThreadResponse};
use libthreadcast::service::validation::{ValidationRequest, ValidationResponse};
use libthreadcast::ThreadcastError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl PromptRequest {
    fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub tweets: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_urls: Vec<String>,
}

/// Map generation failures; upstream detail is logged, not returned
fn generation_error(err: ThreadcastError, public: &str) -> ApiError {
    match err {
        ThreadcastError::InvalidInput(msg) => ApiError::BadRequest(msg),
        ThreadcastError::Config(_) => {
            ApiError::NotConfigured("Generation is not configured".to_string())
        }
        other => {
            error!("{}: {}", public, other);
            ApiError::Internal(public.to_string())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "platform": state.service.platform_name(),
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    request: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(request) = request?;
    let tweets = state
        .service
        .generation()
        .generate_posts(request.prompt())
        .await
        .map_err(|e| generation_error(e, "Failed to generate tweets"))?;

    Ok(Json(GenerateResponse { tweets }))
}

pub async fn generate_image(
    State(state): State<AppState>,
    request: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<GenerateImageResponse>, ApiError> {
    let Json(request) = request?;
    let image_urls = state
        .service
        .generation()
        .generate_images(request.prompt())
        .await
        .map_err(|e| generation_error(e, "Failed to generate image"))?;

    Ok(Json(GenerateImageResponse { image_urls }))
}

pub async fn post_thread(
    State(state): State<AppState>,
    request: Result<Json<PostThreadRequest>, JsonRejection>,
) -> Result<Json<PostThreadResponse>, ApiError> {
    let Json(request) = request.map_err(ApiError::malformed_thread)?;
    let response = state.service.posting().post(request).await?;
    Ok(Json(response))
}

pub async fn validate(
    State(state): State<AppState>,
    request: Result<Json<ValidationRequest>, JsonRejection>,
) -> Result<Json<ValidationResponse>, ApiError> {
    let Json(request) = request?;
    Ok(Json(state.service.validation().validate(&request)))
}
