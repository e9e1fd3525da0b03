//! `generateContent` payloads.

use super::{GenerationRequest, GenerationResponse, Modality};
use crate::codec::EncodedImage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// Variant order matters for untagged decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let parts = vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: request.image.mime_type.clone(),
                    data: request.image.data.clone(),
                },
            },
            Part::Text {
                text: request.prompt.clone(),
            },
        ];

        let generation_config = match request.modality {
            Modality::Image => Some(GenerationConfig {
                response_modalities: vec![Modality::Image],
            }),
            Modality::Text => None,
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config,
        }
    }
}

impl GenerateContentResponse {
    /// Inline images and concatenated text of the first candidate.
    pub fn into_generation_response(self) -> GenerationResponse {
        let parts = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts)
            .unwrap_or_default();

        let mut images = Vec::new();
        let mut text = String::new();
        for part in parts {
            match part {
                Part::InlineData { inline_data } if !inline_data.data.is_empty() => {
                    images.push(EncodedImage::new(inline_data.data, inline_data.mime_type));
                }
                Part::Text { text: chunk } => text.push_str(&chunk),
                _ => {}
            }
        }

        GenerationResponse {
            images,
            text: Some(text),
        }
    }
}
