//! Post and image generation service

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{expand_dir, GenerationConfig};
use crate::credentials::{gemini_api_key, GEMINI_API_KEY};
use crate::error::{ConfigError, Result, ThreadcastError};
use crate::generation::gemini::GeminiClient;
use crate::generation::split::{compose_prompt, image_file_name, split_generated, wants_thread};
use crate::generation::{ImageGenerator, TextGenerator};

/// Generates post drafts and images from prompts
///
/// Built without generators (no API key) every call fails with a
/// configuration error, which the server reports as "not configured".
#[derive(Clone, Default)]
pub struct GenerationService {
    text: Option<Arc<dyn TextGenerator>>,
    images: Option<Arc<dyn ImageGenerator>>,
    image_dir: Option<PathBuf>,
}

impl GenerationService {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        images: Arc<dyn ImageGenerator>,
        image_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            text: Some(text),
            images: Some(images),
            image_dir,
        }
    }

    /// Gemini-backed service, or a disabled one when `GEMINI_API_KEY` is unset
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `image_dir` cannot be expanded or the
    /// HTTP client cannot be built.
    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let image_dir = config.image_dir.as_deref().map(expand_dir).transpose()?;

        let Some(api_key) = gemini_api_key() else {
            info!("{} not set; generation is disabled", GEMINI_API_KEY);
            return Ok(Self {
                image_dir,
                ..Self::default()
            });
        };

        let client = Arc::new(GeminiClient::new(config, api_key)?);
        Ok(Self::new(client.clone(), client, image_dir))
    }

    pub fn is_enabled(&self) -> bool {
        self.text.is_some() && self.images.is_some()
    }

    /// Draft posts for a prompt
    ///
    /// Prompts over 50 characters ask for a thread and the answer is split
    /// into posts; shorter prompts yield exactly one post.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank prompt
    /// - `Config` when generation is disabled
    /// - `Platform(Generation)` when the model call fails
    pub async fn generate_posts(&self, prompt: &str) -> Result<Vec<String>> {
        let prompt = require_prompt(prompt)?;
        let generator = self.text.as_ref().ok_or_else(not_configured)?;

        let thread = wants_thread(prompt);
        let text = generator.generate_text(&compose_prompt(prompt)).await?;
        let posts = split_generated(&text, thread);

        info!("Generated {} post(s) (thread: {})", posts.len(), thread);
        Ok(posts)
    }

    /// Generate images for a prompt, returned as `data:` URIs
    ///
    /// With an image directory configured each image is also written there.
    /// A failed write is logged and does not fail the call.
    pub async fn generate_images(&self, prompt: &str) -> Result<Vec<String>> {
        let prompt = require_prompt(prompt)?;
        let generator = self.images.as_ref().ok_or_else(not_configured)?;

        let images = generator.generate_images(prompt).await?;

        if let Some(dir) = &self.image_dir {
            for (n, image) in images.iter().enumerate() {
                let path = dir.join(image_file_name(prompt, n));
                if let Err(e) = save_image(&path, &image.data).await {
                    warn!("Failed to save generated image to {}: {}", path.display(), e);
                }
            }
        }

        info!("Generated {} image(s)", images.len());
        Ok(images.iter().map(|image| image.data_uri()).collect())
    }
}

/// Reject blank prompts; the prompt itself goes to the model untrimmed
fn require_prompt(prompt: &str) -> Result<&str> {
    if prompt.trim().is_empty() {
        return Err(ThreadcastError::InvalidInput("Prompt is required".to_string()));
    }
    Ok(prompt)
}

fn not_configured() -> ThreadcastError {
    ConfigError::MissingCredential(GEMINI_API_KEY.to_string()).into()
}

async fn save_image(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await
}
