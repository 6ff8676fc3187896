//! Event system for thread posting progress
//!
//! An in-process broadcast bus. The orchestrator emits one event per
//! completed step; the CLI turns them into progress lines and the server
//! logs them. Emitting never blocks: with no subscribers the event is
//! dropped, and lagging subscribers lose the oldest events.
//!
//! # Example
//!
//! ```no_run
//! use libthreadcast::service::events::{Event, EventBus};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::ThreadStarted {
//!     run_id: "run-1".to_string(),
//!     posts: 3,
//!     media: 1,
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("Received: {:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast bus for progress events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus buffering `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: Event) {
        // Err only means nobody is listening
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Progress of one thread posting run
///
/// `run_id` ties together the events of one `post_thread` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ThreadStarted {
        run_id: String,
        posts: usize,
        media: usize,
    },

    /// One attachment finished uploading
    MediaUploaded {
        run_id: String,
        index: usize,
        handle: String,
    },

    PostSubmitted {
        run_id: String,
        index: usize,
        post_id: String,
    },

    ThreadCompleted {
        run_id: String,
        post_ids: Vec<String>,
    },

    /// The run stopped; `posted` ids stay live upstream
    ThreadFailed {
        run_id: String,
        step: String,
        index: usize,
        error: String,
        posted: Vec<String>,
    },
}

impl Event {
    pub fn run_id(&self) -> &str {
        match self {
            Event::ThreadStarted { run_id, .. }
            | Event::MediaUploaded { run_id, .. }
            | Event::PostSubmitted { run_id, .. }
            | Event::ThreadCompleted { run_id, .. }
            | Event::ThreadFailed { run_id, .. } => run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        let event = Event::ThreadStarted {
            run_id: "run".to_string(),
            posts: 2,
            media: 0,
        };
        event_bus.emit(event.clone());

        assert_eq!(receiver.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut first = event_bus.subscribe();
        let mut second = event_bus.subscribe();
        assert_eq!(event_bus.subscriber_count(), 2);

        event_bus.emit(Event::PostSubmitted {
            run_id: "run".to_string(),
            index: 0,
            post_id: "1".to_string(),
        });

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[test]
    fn test_emit_without_subscribers() {
        let event_bus = EventBus::new(10);
        event_bus.emit(Event::ThreadCompleted {
            run_id: "run".to_string(),
            post_ids: vec![],
        });
        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::ThreadFailed {
            run_id: "run".to_string(),
            step: "submit".to_string(),
            index: 1,
            error: "rejected".to_string(),
            posted: vec!["1".to_string()],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "thread_failed");
        assert_eq!(json["step"], "submit");
        assert_eq!(event.run_id(), "run");
    }
}
