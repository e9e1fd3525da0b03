use crate::{
    config::GenAiConfig,
    error::{Result, StudioError},
    models::{
        gemini::{GenerateContentRequest, GenerateContentResponse},
        GenerationRequest, GenerationResponse, Modality,
    },
};
use async_trait::async_trait;
use reqwest::Client;

/// The remote generation service.
///
/// A response without any image is a normal outcome and must be returned as
/// `Ok`; `Err` is reserved for transport and protocol failures.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate_content(&self, request: &GenerationRequest) -> Result<GenerationResponse>;
}

#[derive(Clone)]
pub struct GeminiBackend {
    http: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    text_model: String,
}

impl GeminiBackend {
    pub fn new(config: &GenAiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| StudioError::Config("GEMINI_API_KEY or API_KEY not set".into()))?;

        Ok(Self {
            http: Client::new(),
            api_key,
            base_url: config.base_url(),
            image_model: config.image_model().to_string(),
            text_model: config.text_model().to_string(),
        })
    }

    fn model_for(&self, modality: Modality) -> &str {
        match modality {
            Modality::Image => &self.image_model,
            Modality::Text => &self.text_model,
        }
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let model = model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.base_url, model_path)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate_content(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let model = self.model_for(request.modality);
        let endpoint = self.endpoint_for_model(model);
        let payload = GenerateContentRequest::from(request);

        log::info!("Invoking model: {}", model);
        log::debug!(
            "Request: {} prompt chars, {} ({} base64 bytes)",
            request.prompt.len(),
            request.image.mime_type,
            request.image.data.len()
        );

        let response = self
            .http
            .post(&endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                log::error!("Request to {} failed: {:?}", model, e);
                StudioError::Request(format!("{} request failed: {}", model, e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StudioError::Response(format!("{} response body read failed: {}", model, e)))?;

        if !status.is_success() {
            log::error!("{} returned {}", model, status);
            return Err(StudioError::Response(format!(
                "{} request failed ({}): {}",
                model,
                status.as_u16(),
                truncate(&body, 512)
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| StudioError::Serialization(format!("{} returned invalid JSON: {}", model, e)))?;

        Ok(parsed.into_generation_response())
    }
}
