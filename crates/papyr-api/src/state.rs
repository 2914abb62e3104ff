//! Shared application state.

use papyr_core::Config;
use papyr_ingest::{ImageIngestor, IngestError};
use papyr_storage::ObjectStore;
use std::sync::Arc;

/// Everything the handlers need, built once at startup and shared behind an
/// `Arc`.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
    pub ingestor: Arc<ImageIngestor>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ObjectStore>) -> Result<Self, IngestError> {
        let ingestor = ImageIngestor::new(
            store.clone(),
            config.owned_url_marker(),
            config.upload_folder.clone(),
        )?;
        Ok(AppState {
            config,
            store,
            ingestor: Arc::new(ingestor),
        })
    }
}
