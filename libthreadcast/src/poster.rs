//! Thread posting orchestration
//!
//! [`ThreadPoster`] turns a [`Thread`] into a live reply chain:
//!
//! 1. every attachment is uploaded concurrently, and nothing is submitted
//!    until all uploads have succeeded;
//! 2. posts are submitted strictly in order, post 0 standalone and post *i*
//!    as a reply to post *i-1*, each with the handles uploaded for it.
//!
//! The first failure stops the run. Posts already submitted stay live; the
//! returned [`ThreadError`] lists their ids so the caller can report them.
//! Running the same thread again after a partial failure posts the leading
//! posts a second time.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ThreadError, ThreadStep};
use crate::media::{check_source, MediaUploader};
use crate::platforms::Platform;
use crate::service::events::{Event, EventBus};
use crate::submit::PostSubmitter;
use crate::types::{AttachmentMap, MediaHandle, PostId, Thread, ThreadOutcome, ThreadPost};

/// Handles grouped by post index, in attachment order within each post
type HandleMap = BTreeMap<usize, Vec<MediaHandle>>;

/// Posts whole threads through one platform
#[derive(Clone)]
pub struct ThreadPoster {
    platform_name: String,
    uploader: MediaUploader,
    submitter: PostSubmitter,
    events: Option<EventBus>,
}

impl ThreadPoster {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        let uploader = MediaUploader::new(Arc::clone(&platform));
        Self::from_parts(platform, uploader)
    }

    /// Build with a preconfigured uploader (custom HTTP client for fetches)
    pub fn from_parts(platform: Arc<dyn Platform>, uploader: MediaUploader) -> Self {
        Self {
            platform_name: platform.name().to_string(),
            submitter: PostSubmitter::new(platform),
            uploader,
            events: None,
        }
    }

    /// Report progress on `events`
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    /// Post a thread and return the ids of all posts, in thread order
    ///
    /// # Errors
    ///
    /// Returns a [`ThreadError`] on the first failing upload or submission.
    /// Its `posted` field holds the ids submitted before the failure, which
    /// is always empty for upload failures.
    pub async fn post_thread(&self, thread: Thread) -> Result<ThreadOutcome, ThreadError> {
        let run_id = Uuid::new_v4().to_string();
        let media_count = thread.attachments().len();
        let (posts, attachments) = thread.into_parts();

        info!(
            "Posting thread of {} post(s) with {} media item(s) to {} (run {})",
            posts.len(),
            media_count,
            self.platform_name,
            run_id
        );
        self.emit(Event::ThreadStarted {
            run_id: run_id.clone(),
            posts: posts.len(),
            media: media_count,
        });

        let result = self.run(&run_id, &posts, &attachments).await;

        match &result {
            Ok(post_ids) => {
                info!("Thread posted to {} (run {})", self.platform_name, run_id);
                self.emit(Event::ThreadCompleted {
                    run_id,
                    post_ids: post_ids.iter().map(ToString::to_string).collect(),
                });
            }
            Err(e) => {
                warn!("Thread posting to {} stopped: {} (run {})", self.platform_name, e, run_id);
                self.emit(Event::ThreadFailed {
                    run_id,
                    step: e.step.to_string(),
                    index: e.index,
                    error: e.kind.to_string(),
                    posted: e.posted.iter().map(ToString::to_string).collect(),
                });
            }
        }

        result
    }

    async fn run(
        &self,
        run_id: &str,
        posts: &[ThreadPost],
        attachments: &AttachmentMap,
    ) -> Result<ThreadOutcome, ThreadError> {
        let mut handles = self.upload_all(run_id, attachments).await?;

        let mut posted: Vec<PostId> = Vec::with_capacity(posts.len());
        for (index, post) in posts.iter().enumerate() {
            let media = handles.remove(&index).unwrap_or_default();

            match self.submitter.submit(&post.text, &media, posted.last()).await {
                Ok(post_id) => {
                    debug!("Post {} submitted as {}", index, post_id);
                    self.emit(Event::PostSubmitted {
                        run_id: run_id.to_string(),
                        index,
                        post_id: post_id.to_string(),
                    });
                    posted.push(post_id);
                }
                Err(kind) => {
                    return Err(ThreadError::new(kind, ThreadStep::Submit, index, posted));
                }
            }
        }

        Ok(posted)
    }

    /// Upload every attachment concurrently; returns once all have succeeded
    async fn upload_all(
        &self,
        run_id: &str,
        attachments: &AttachmentMap,
    ) -> Result<HandleMap, ThreadError> {
        // Unresolvable sources fail before any upload starts
        for (index, items) in attachments {
            for attachment in items {
                check_source(&attachment.source).map_err(|kind| {
                    ThreadError::new(kind, ThreadStep::Upload, *index, Vec::new())
                })?;
            }
        }

        let uploads = attachments
            .iter()
            .flat_map(|(index, items)| items.iter().map(move |item| (*index, item)))
            .map(|(index, attachment)| async move {
                let handle = self.uploader.upload(attachment).await.map_err(|kind| {
                    ThreadError::new(kind, ThreadStep::Upload, index, Vec::new())
                })?;

                self.emit(Event::MediaUploaded {
                    run_id: run_id.to_string(),
                    index,
                    handle: handle.to_string(),
                });
                Ok::<_, ThreadError>((index, handle))
            });

        // try_join_all keeps input order, so per-post attachment order survives
        let uploaded = try_join_all(uploads).await?;

        let mut handles = HandleMap::new();
        for (index, handle) in uploaded {
            handles.entry(index).or_default().push(handle);
        }
        Ok(handles)
    }

    fn emit(&self, event: Event) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }
}
