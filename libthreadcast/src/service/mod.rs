//! Service layer for Threadcast
//!
//! [`ThreadcastService`] is the single entry point the server and the CLI
//! build on. It owns the configured platform and hands out the
//! sub-services:
//!
//! - `PostingService`: editor requests → validated thread → reply chain
//! - `GenerationService`: prompt → post drafts / images
//! - `ValidationService`: live draft checks
//! - `EventBus`: progress events of posting runs
//!
//! # Example
//!
//! ```no_run
//! use libthreadcast::service::ThreadcastService;
//! use libthreadcast::service::posting::PostThreadRequest;
//!
//! # async fn example() -> libthreadcast::Result<()> {
//! let service = ThreadcastService::new()?;
//!
//! let request = PostThreadRequest {
//!     posts: vec!["First".to_string(), "Second".to_string()],
//!     media: vec![],
//! };
//!
//! let response = service.posting().post(request).await?;
//! println!("Posted {} posts", response.post_ids.len());
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod generation;
pub mod posting;
pub mod validation;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::media::MediaUploader;
use crate::platforms::{create_platform, Platform};

use self::events::{EventBus, EventReceiver};
use self::generation::GenerationService;
use self::posting::PostingService;
use self::validation::ValidationService;

/// Main service facade
pub struct ThreadcastService {
    config: Arc<Config>,
    platform: Arc<dyn Platform>,
    posting: PostingService,
    generation: GenerationService,
    validation: ValidationService,
    event_bus: EventBus,
}

impl ThreadcastService {
    /// Create a service from the default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or fails
    /// startup validation (see [`ThreadcastService::from_config`]).
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service from an explicit configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `posting.timeout_secs` is zero
    /// - the X platform is selected and a credential is missing
    /// - the generation image directory cannot be expanded
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let platform = create_platform(&config)?;
        let generation = GenerationService::from_config(&config.generation)?;
        Self::with_components(config, platform, generation)
    }

    /// Assemble a service around an existing platform and generator
    ///
    /// Used by tests and embedders that bring their own backends.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the media fetch client cannot be
    /// built.
    pub fn with_components(
        config: Config,
        platform: Arc<dyn Platform>,
        generation: GenerationService,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.x.request_timeout_secs))
            .build()
            .map_err(|e| ConfigError::InvalidValue(format!("Failed to build HTTP client: {}", e)))?;

        let event_bus = EventBus::new(100);
        let uploader = MediaUploader::with_client(Arc::clone(&platform), http);
        let posting = PostingService::new(
            Arc::clone(&platform),
            uploader,
            Duration::from_secs(config.posting.timeout_secs),
            event_bus.clone(),
        );
        let validation = ValidationService::for_platform(platform.as_ref());

        Ok(Self {
            config: Arc::new(config),
            platform,
            posting,
            generation,
            validation,
            event_bus,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform_name(&self) -> &str {
        self.platform.name()
    }

    pub fn posting(&self) -> &PostingService {
        &self.posting
    }

    pub fn generation(&self) -> &GenerationService {
        &self.generation
    }

    pub fn validation(&self) -> &ValidationService {
        &self.validation
    }

    /// Subscribe to posting progress events
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
