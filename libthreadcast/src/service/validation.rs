//! Draft validation service
//!
//! Backs the editor's live counter: per-post character counts against the
//! platform limit plus media warnings. Purely local; nothing here touches the
//! network, and posting does not depend on it.

use serde::{Deserialize, Serialize};

use crate::platforms::Platform;
use crate::service::posting::{MediaDescriptor, MediaSourceType};
use crate::types::{MediaKind, MediaSource, ThreadPost, MAX_IMAGES_PER_POST, MAX_POST_CHARS};

#[derive(Debug, Clone, Copy)]
pub struct ValidationService {
    character_limit: usize,
    max_images: usize,
}

/// Draft to check, same shape as a posting request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationRequest {
    #[serde(default, alias = "tweets")]
    pub posts: Vec<String>,
    #[serde(default)]
    pub media: Vec<MediaDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResponse {
    /// True when the draft has no errors (warnings allowed)
    pub valid: bool,
    pub character_limit: usize,
    pub posts: Vec<PostValidation>,
    /// Problems not tied to one post
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostValidation {
    pub index: usize,
    pub characters: usize,
    /// Negative once over the limit
    pub remaining: i64,
    pub over_limit: bool,
    pub media: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Default for ValidationService {
    fn default() -> Self {
        Self {
            character_limit: MAX_POST_CHARS,
            max_images: MAX_IMAGES_PER_POST,
        }
    }
}

impl ValidationService {
    pub fn new(character_limit: usize, max_images: usize) -> Self {
        Self {
            character_limit,
            max_images,
        }
    }

    /// Use the limits the platform advertises
    pub fn for_platform(platform: &dyn Platform) -> Self {
        Self::new(
            platform.character_limit().unwrap_or(MAX_POST_CHARS),
            platform.max_images(),
        )
    }

    pub fn validate(&self, request: &ValidationRequest) -> ValidationResponse {
        let mut errors = Vec::new();
        if request.posts.is_empty() {
            errors.push("Thread must contain at least one post".to_string());
        }

        let mut posts: Vec<PostValidation> = request
            .posts
            .iter()
            .enumerate()
            .map(|(index, text)| self.validate_text(index, text))
            .collect();

        for descriptor in &request.media {
            let index = descriptor.target_post_index;
            match posts.get_mut(index) {
                Some(post) => {
                    post.media += 1;
                    if let Some(problem) = source_problem(descriptor) {
                        post.errors.push(problem);
                    }
                }
                None => errors.push(format!(
                    "Media targets post {} but the thread has {} post(s)",
                    index,
                    request.posts.len()
                )),
            }
        }

        for post in &mut posts {
            let kinds: Vec<MediaKind> = request
                .media
                .iter()
                .filter(|d| d.target_post_index == post.index)
                .map(descriptor_kind)
                .collect();
            post.warnings.extend(self.media_warnings(&kinds));
        }

        let valid = errors.is_empty() && posts.iter().all(|p| p.errors.is_empty());
        ValidationResponse {
            valid,
            character_limit: self.character_limit,
            posts,
            errors,
        }
    }

    fn validate_text(&self, index: usize, text: &str) -> PostValidation {
        let characters = ThreadPost::new(text).char_count();
        let remaining = self.character_limit as i64 - characters as i64;
        let over_limit = remaining < 0;

        let mut errors = Vec::new();
        if text.trim().is_empty() {
            errors.push("Post is empty".to_string());
        }
        if over_limit {
            errors.push(format!(
                "Post exceeds {} characters by {}",
                self.character_limit, -remaining
            ));
        }

        PostValidation {
            index,
            characters,
            remaining,
            over_limit,
            media: 0,
            errors,
            warnings: Vec::new(),
        }
    }

    fn media_warnings(&self, kinds: &[MediaKind]) -> Vec<String> {
        let mut warnings = Vec::new();
        let images = kinds.iter().filter(|k| **k == MediaKind::Image).count();
        let motion = kinds.len() - images;

        if images > self.max_images {
            warnings.push(format!(
                "{} images attached; at most {} are accepted per post",
                images, self.max_images
            ));
        }
        if motion > 1 || (motion == 1 && images > 0) {
            warnings.push("A video or GIF must be the only media in its post".to_string());
        }
        warnings
    }
}

fn descriptor_kind(descriptor: &MediaDescriptor) -> MediaKind {
    descriptor
        .kind
        .unwrap_or_else(|| MediaKind::from_mime_str(&descriptor.mime_type))
}

fn source_problem(descriptor: &MediaDescriptor) -> Option<String> {
    match descriptor.source_type {
        MediaSourceType::File => match &descriptor.data {
            Some(data) if !data.trim().is_empty() => None,
            _ => Some("File media has no data".to_string()),
        },
        MediaSourceType::Url => match descriptor.url.as_deref().map(MediaSource::from_url) {
            Some(MediaSource::Url(_)) => None,
            Some(MediaSource::LocalRef(reference)) => Some(format!(
                "'{}' only exists in the browser; attach the file content instead",
                reference
            )),
            _ => Some("URL media has no url".to_string()),
        },
    }
}
