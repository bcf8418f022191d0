//! Error types for vision operations.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur while preparing or classifying an image.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Bytes are not a decodable image.
    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The runtime rejected the model artifact at startup.
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    /// The model failed or produced unusable output at call time.
    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the caller sent bad input rather than the server failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, VisionError::Decode(_))
    }
}
