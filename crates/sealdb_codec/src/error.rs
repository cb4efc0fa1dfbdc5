//! Error types for the codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding collection text.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The plaintext is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The plaintext is valid JSON but not a record sequence.
    #[error("invalid collection shape: {message}")]
    InvalidShape {
        /// Description of the shape problem.
        message: String,
    },
}

impl CodecError {
    /// Creates an invalid shape error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        Self::InvalidShape {
            message: message.into(),
        }
    }
}
