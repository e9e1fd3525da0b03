use thiserror::Error;

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Could not read image: {0}")]
    Decode(String),
    #[error("Generation error: {0}")]
    Generation(String),
    #[error("AI failed to generate the requested number of images. Got {obtained}, expected {expected}.")]
    IncompleteGeneration { obtained: usize, expected: usize },
    #[error("{0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Request error: {0}")]
    Request(String),
    #[error("Response error: {0}")]
    Response(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Encoding error: {0}")]
    Encode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    /// Errors the user can fix by changing their input, raised before any remote call.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            StudioError::InvalidGeometry(_) | StudioError::Validation(_)
        )
    }
}

/// Non-fatal outcome of a download conversion that fell back to the original format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Could not convert image to {target}, delivering original format instead: {reason}")]
pub struct ConversionWarning {
    pub target: String,
    pub reason: String,
}

pub type Result<T> = std::result::Result<T, StudioError>;
