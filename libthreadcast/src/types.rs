//! Core types for Threadcast

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, ThreadError};

/// Maximum post length, counted in Unicode scalar values
pub const MAX_POST_CHARS: usize = 280;

/// Upstream limit on still images attached to one post
pub const MAX_IMAGES_PER_POST: usize = 4;

/// Identifier of a submitted post, as returned by the upstream service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque id of uploaded media, consumed by exactly one post submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaHandle(String);

impl MediaHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse media category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Gif,
}

impl MediaKind {
    /// Derive the kind from a MIME string such as `image/png`
    ///
    /// Anything that is neither an image nor a video is treated as a gif,
    /// matching how the editor tags picked files.
    pub fn from_mime_str(mime: &str) -> Self {
        let mime = mime.to_lowercase();
        if mime == "image/gif" {
            Self::Gif
        } else if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Gif
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Gif => "gif",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the bytes of an attachment come from
#[derive(Clone, PartialEq, Eq)]
pub enum MediaSource {
    /// Content already decoded in memory
    Bytes(Vec<u8>),
    /// Remote location the uploader fetches (`http(s)://` or `data:`)
    Url(String),
    /// A reference only meaningful to the client that made it (e.g. `blob:` URLs)
    LocalRef(String),
}

impl std::fmt::Debug for MediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaSource::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            MediaSource::Url(url) if url.starts_with("data:") => {
                write!(f, "Url(data URI, {} chars)", url.len())
            }
            MediaSource::Url(url) => write!(f, "Url({})", url),
            MediaSource::LocalRef(reference) => write!(f, "LocalRef({})", reference),
        }
    }
}

impl MediaSource {
    /// Classify a URL-like string coming from a client
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let lower = url.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:")
        {
            Self::Url(url)
        } else {
            Self::LocalRef(url)
        }
    }
}

/// A piece of media attached to one post of a thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub source: MediaSource,
    pub mime_type: String,
    pub kind: MediaKind,
    pub target_post_index: usize,
}

impl MediaAttachment {
    pub fn new(source: MediaSource, mime_type: impl Into<String>, target_post_index: usize) -> Self {
        let mime_type = mime_type.into();
        Self {
            kind: MediaKind::from_mime_str(&mime_type),
            source,
            mime_type,
            target_post_index,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>, mime_type: impl Into<String>, target_post_index: usize) -> Self {
        Self::new(MediaSource::Bytes(bytes), mime_type, target_post_index)
    }

    pub fn from_url(url: impl Into<String>, mime_type: impl Into<String>, target_post_index: usize) -> Self {
        Self::new(MediaSource::from_url(url), mime_type, target_post_index)
    }

    /// Override the derived kind with an explicit tag
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }
}

/// One post body of a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadPost {
    pub text: String,
}

impl ThreadPost {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Ids of a fully posted thread; id `i` replies to id `i - 1`
pub type ThreadOutcome = Vec<PostId>;

/// Attachments grouped by the post they belong to, in input order per post
pub type AttachmentMap = BTreeMap<usize, Vec<MediaAttachment>>;

/// An ordered, non-empty sequence of posts plus their media
///
/// Constructed only through [`Thread::new`], so every attachment points at an
/// existing post and no post body is blank.
#[derive(Debug, Clone)]
pub struct Thread {
    posts: Vec<ThreadPost>,
    attachments: Vec<MediaAttachment>,
}

impl Thread {
    pub fn new(
        posts: Vec<String>,
        attachments: Vec<MediaAttachment>,
    ) -> std::result::Result<Self, ThreadError> {
        if posts.is_empty() {
            return Err(ThreadError::validation(
                PlatformError::InvalidInput("Thread must contain at least one post".to_string()),
                0,
            ));
        }

        if let Some(index) = posts.iter().position(|text| text.trim().is_empty()) {
            return Err(ThreadError::validation(
                PlatformError::InvalidInput(format!("Post {} is empty", index)),
                index,
            ));
        }

        if let Some(bad) = attachments
            .iter()
            .find(|a| a.target_post_index >= posts.len())
        {
            return Err(ThreadError::validation(
                PlatformError::InvalidInput(format!(
                    "Media targets post {} but the thread has {} post(s)",
                    bad.target_post_index,
                    posts.len()
                )),
                bad.target_post_index,
            ));
        }

        Ok(Self {
            posts: posts.into_iter().map(ThreadPost::new).collect(),
            attachments,
        })
    }

    /// A standalone post without media
    pub fn single(text: impl Into<String>) -> std::result::Result<Self, ThreadError> {
        Self::new(vec![text.into()], Vec::new())
    }

    pub fn posts(&self) -> &[ThreadPost] {
        &self.posts
    }

    pub fn attachments(&self) -> &[MediaAttachment] {
        &self.attachments
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Consume the thread, grouping attachments by target post
    pub fn into_parts(self) -> (Vec<ThreadPost>, AttachmentMap) {
        let mut by_post = AttachmentMap::new();
        for attachment in self.attachments {
            by_post
                .entry(attachment.target_post_index)
                .or_default()
                .push(attachment);
        }
        (self.posts, by_post)
    }
}
