pub mod backend;
pub mod image_client;
#[cfg(test)]
pub(crate) mod mock;
pub mod text_client;

use crate::{config::GenAiConfig, error::Result};
use std::sync::Arc;

pub use backend::{GeminiBackend, GenerationBackend};
pub use image_client::ImageClient;
pub use text_client::TextClient;

#[derive(Clone)]
pub struct GenAiClient {
    image_client: ImageClient,
    text_client: TextClient,
}

impl GenAiClient {
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let backend = GeminiBackend::new(config)?;
        log::info!(
            "Using image model {} and text model {}",
            config.image_model(),
            config.text_model()
        );
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn with_backend(backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            image_client: ImageClient::new(backend.clone()),
            text_client: TextClient::new(backend),
        }
    }

    pub fn image(&self) -> &ImageClient {
        &self.image_client
    }

    pub fn text(&self) -> &TextClient {
        &self.text_client
    }
}
