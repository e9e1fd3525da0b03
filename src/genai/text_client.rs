use super::GenerationBackend;
use crate::{codec::EncodedImage, error::Result, models::GenerationRequest};
use std::sync::Arc;

pub const DESCRIBE_SKETCH_PROMPT: &str = "Describe this architectural sketch in a concise and descriptive way, focusing on style, materials, and environment. This description will be used as a prompt to generate a photorealistic rendering.";

#[derive(Clone)]
pub struct TextClient {
    backend: Arc<dyn GenerationBackend>,
}

impl TextClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Ask the text model for a prompt describing `image`. An empty answer is not an error.
    pub async fn describe_image(&self, image: &EncodedImage) -> Result<String> {
        let request = GenerationRequest::text(image.clone(), DESCRIBE_SKETCH_PROMPT);
        let response = self.backend.generate_content(&request).await?;
        let text = response.text.unwrap_or_default().trim().to_string();

        log::debug!("Suggested prompt: {} chars", text.len());
        Ok(text)
    }
}
