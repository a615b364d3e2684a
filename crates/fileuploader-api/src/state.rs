//! Shared application state passed to all handlers.

use std::sync::Arc;

use fileuploader_core::config::AppConfig;
use fileuploader_core::traits::codec::ImageCodec;
use fileuploader_core::traits::persist::FilePersister;
use fileuploader_core::traits::validate::{AcceptAll, FileValidator};
use fileuploader_storage::imaging::RasterCodec;
use fileuploader_storage::providers::LocalPersister;

/// Application state shared across handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Stores accepted uploads.
    pub persister: Arc<dyn FilePersister>,
    /// Application-supplied per-file check.
    pub validator: Arc<dyn FileValidator>,
    /// Codec used for image post-processing.
    pub codec: Arc<dyn ImageCodec>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("persister", &self.persister)
            .finish()
    }
}

impl AppState {
    /// State with local persistence, no custom validation, and the
    /// built-in raster codec.
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            persister: Arc::new(LocalPersister::default()),
            validator: Arc::new(AcceptAll),
            codec: Arc::new(RasterCodec),
        }
    }

    /// Replace the per-file check.
    pub fn with_validator(mut self, validator: Arc<dyn FileValidator>) -> Self {
        self.validator = validator;
        self
    }
}
