//! AI generation of post text and images
//!
//! Two small traits sit at the model boundary so the service layer and the
//! tests never depend on a concrete provider. [`gemini::GeminiClient`] is the
//! production implementation; [`mock::StaticGenerator`] returns canned output.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::platforms::PlatformResult;

pub mod gemini;
pub mod mock;
pub mod split;

/// Text model boundary
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Return the raw model output for a fully composed prompt
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Generation` when the model call fails or the
    /// response carries no text.
    async fn generate_text(&self, prompt: &str) -> PlatformResult<String>;
}

/// Image model boundary
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Return every image part of the model response, in order
    ///
    /// Text parts of the response are not returned.
    async fn generate_images(&self, prompt: &str) -> PlatformResult<Vec<GeneratedImage>>;
}

/// One decoded image from the model
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl GeneratedImage {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// `data:` URI as handed to the editor and accepted back as a media URL
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

impl std::fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}
