//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::{ConfigError, PlatformError, Result};
use crate::generation::{GeneratedImage, ImageGenerator, TextGenerator};
use crate::platforms::PlatformResult;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for the Gemini REST API
pub struct GeminiClient {
    client: Client,
    base: String,
    text_model: String,
    image_model: String,
    api_key: SecretString,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationSettings>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GeminiClient {
    /// Create a client from the `[generation]` settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &GenerationConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base: config.gemini_base.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            api_key,
        })
    }

    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        settings: Option<GenerationSettings>,
    ) -> PlatformResult<Vec<ResponsePart>> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base, model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
            generation_config: settings,
        };

        debug!("Calling {} ({} prompt chars)", model, prompt.chars().count());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| PlatformError::Generation(format!("{} request failed: {}", model, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Generation(format!(
                "{} returned {}: {}",
                model,
                status,
                body.trim().chars().take(200).collect::<String>()
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            PlatformError::Generation(format!("Unexpected {} response: {}", model, e))
        })?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> PlatformResult<String> {
        let parts = self.generate(&self.text_model, prompt, None).await?;
        let text: String = parts.into_iter().filter_map(|part| part.text).collect();

        if text.trim().is_empty() {
            return Err(PlatformError::Generation(
                "Model response contained no text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate_images(&self, prompt: &str) -> PlatformResult<Vec<GeneratedImage>> {
        let settings = GenerationSettings {
            response_modalities: vec!["Text", "Image"],
        };
        let parts = self
            .generate(&self.image_model, prompt, Some(settings))
            .await?;

        let mut images = Vec::new();
        for part in parts {
            if let Some(text) = part.text {
                info!("Image model said: {}", text);
            } else if let Some(inline) = part.inline_data {
                let data = STANDARD.decode(inline.data.trim()).map_err(|e| {
                    PlatformError::Generation(format!("Invalid image data: {}", e))
                })?;
                if !data.is_empty() {
                    let mime = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
                    images.push(GeneratedImage::new(mime, data));
                }
            }
        }

        Ok(images)
    }
}
