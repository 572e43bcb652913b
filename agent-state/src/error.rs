//! Error types for the State Service.

use thiserror::Error;

/// Errors produced by a [`crate::StateService`] backend.
#[derive(Debug, Error)]
pub enum StateError {
    /// Underlying I/O failure while reading or writing a state file.
    #[error("i/o error: {source}")]
    Io {
        /// Source [`std::io::Error`].
        #[from]
        source: std::io::Error,
    },
    /// Serialization or deserialization error.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
    /// The key contained characters unsafe to use as a filename component.
    #[error("invalid state key `{0}`")]
    InvalidKey(String),
}

/// Result type alias for state operations.
pub type StateResult<T> = Result<T, StateError>;
