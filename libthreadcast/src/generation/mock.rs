//! Canned generator for local runs and tests

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::generation::{GeneratedImage, ImageGenerator, TextGenerator};
use crate::platforms::PlatformResult;

/// Returns fixed text and images, recording every prompt it receives
#[derive(Clone, Default)]
pub struct StaticGenerator {
    text: Option<String>,
    images: Vec<GeneratedImage>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StaticGenerator {
    pub fn new(text: impl Into<String>, images: Vec<GeneratedImage>) -> Self {
        Self {
            text: Some(text.into()),
            images,
            prompts: Arc::default(),
        }
    }

    /// A generator whose every call fails
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, prompt: &str) {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate_text(&self, prompt: &str) -> PlatformResult<String> {
        self.record(prompt);
        self.text
            .clone()
            .ok_or_else(|| PlatformError::Generation("Static generator has no text".to_string()))
    }
}

#[async_trait]
impl ImageGenerator for StaticGenerator {
    async fn generate_images(&self, prompt: &str) -> PlatformResult<Vec<GeneratedImage>> {
        self.record(prompt);
        if self.text.is_none() {
            return Err(PlatformError::Generation(
                "Static generator is set to fail".to_string(),
            ));
        }
        Ok(self.images.clone())
    }
}
