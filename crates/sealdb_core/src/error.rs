//! Error types for SealDB core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sealdb_storage::StorageError),

    /// Collection plaintext codec error.
    #[error("codec error: {0}")]
    Codec(#[from] sealdb_codec::CodecError),

    /// An aggregate was applied to an empty input.
    #[error("aggregate input is empty")]
    EmptyInput,

    /// The aggregate operation name is not recognized.
    #[error("unsupported aggregate operation: {name}")]
    UnsupportedAggregate {
        /// The unrecognized operation name.
        name: String,
    },

    /// A field spec names a transform that does not exist.
    #[error("unknown transform: {name}")]
    UnknownTransform {
        /// The unrecognized transform name.
        name: String,
    },

    /// A predicate's structural form is not well shaped.
    #[error("malformed predicate: {message}")]
    MalformedPredicate {
        /// Description of the shape problem.
        message: String,
    },

    /// A field spec's structural form is not well shaped.
    #[error("malformed field spec: {message}")]
    MalformedSpec {
        /// Description of the shape problem.
        message: String,
    },
}

impl CoreError {
    /// Creates a malformed predicate error.
    pub fn malformed_predicate(message: impl Into<String>) -> Self {
        Self::MalformedPredicate {
            message: message.into(),
        }
    }

    /// Creates a malformed field spec error.
    pub fn malformed_spec(message: impl Into<String>) -> Self {
        Self::MalformedSpec {
            message: message.into(),
        }
    }

    /// Creates an unknown transform error.
    pub fn unknown_transform(name: impl Into<String>) -> Self {
        Self::UnknownTransform { name: name.into() }
    }
}
