use super::Modality;
use crate::codec::EncodedImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One image + prompt call to the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub image: EncodedImage,
    pub prompt: String,
    pub modality: Modality,
}

impl GenerationRequest {
    pub fn image(image: EncodedImage, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            modality: Modality::Image,
        }
    }

    pub fn text(image: EncodedImage, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            modality: Modality::Text,
        }
    }
}

/// What came back from one call. Zero images is a valid response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub images: Vec<EncodedImage>,
    pub text: Option<String>,
}

impl GenerationResponse {
    pub fn with_image(image: EncodedImage) -> Self {
        Self {
            images: vec![image],
            text: None,
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            images: Vec::new(),
            text: Some(text.into()),
        }
    }

    pub fn into_first_image(self) -> Option<EncodedImage> {
        self.images.into_iter().next()
    }
}

/// Ordered requests issued for one user action.
#[derive(Debug, Clone)]
pub struct GenerationBatch {
    pub id: Uuid,
    pub requests: Vec<GenerationRequest>,
}

impl GenerationBatch {
    /// `count` identical requests against the same image and prompt.
    pub fn repeated(image: &EncodedImage, prompt: &str, count: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            requests: (0..count)
                .map(|_| GenerationRequest::image(image.clone(), prompt))
                .collect(),
        }
    }

    /// One request per prompt, in prompt order.
    pub fn variations(image: &EncodedImage, prompts: &[String]) -> Self {
        Self {
            id: Uuid::new_v4(),
            requests: prompts
                .iter()
                .map(|prompt| GenerationRequest::image(image.clone(), prompt.as_str()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

/// A generated image and its 1-based position within its batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultImage {
    pub index: usize,
    pub image: EncodedImage,
}

impl ResultImage {
    pub fn data_url(&self) -> String {
        self.image.data_url()
    }
}
