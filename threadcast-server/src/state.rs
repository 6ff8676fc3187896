use std::sync::Arc;

use libthreadcast::service::ThreadcastService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ThreadcastService>,
}

impl AppState {
    pub fn new(service: ThreadcastService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}
