//! Architectural image studio.
//!
//! Load a photo or sketch, crop it to a region or aspect ratio, and send it to
//! a generative image model for enhancement, perspective variations or a
//! sketch-to-render pass. Results can be converted and saved as PNG or JPEG.

pub mod codec;
pub mod config;
pub mod download;
pub mod error;
pub mod flows;
pub mod genai;
pub mod geometry;
pub mod logger;
pub mod models;
pub mod prompt;

pub use codec::{DownloadFormat, EncodedImage, ImageKind, SourceImage};
pub use config::{Config, GenAiConfig};
pub use download::Download;
pub use error::{ConversionWarning, Result, StudioError};
pub use flows::{EnhanceFlow, PerspectiveFlow, SketchFlow, Stage};
pub use genai::{GenAiClient, GeminiBackend, GenerationBackend, ImageClient, TextClient};
pub use geometry::{AspectRatio, CropRegion, Dimensions};
pub use models::{GenerationBatch, GenerationRequest, GenerationResponse, Modality, ResultImage};
pub use prompt::{CameraEffect, CameraHeight, CameraLens, PerspectiveOptions};
