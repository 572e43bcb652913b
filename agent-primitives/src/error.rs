//! Shared error definitions for agent primitives.

use thiserror::Error;

/// Result alias used throughout the agent runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while manipulating agent primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The supplied agent id was empty or contained a brace character.
    #[error("invalid agent id `{id}`")]
    InvalidAgentId {
        /// The offending identifier string.
        id: String,
    },
}
