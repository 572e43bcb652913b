//! Config loading errors.

use std::path::PathBuf;

use thiserror::Error;

/// Failure loading or validating one config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Could not read the file or directory.
    #[error("i/o error reading {path}: {source}")]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// The file's contents were not valid JSON, or didn't decode into an
    /// [`crate::AgentConfigEntry`].
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// The path whose contents failed to parse.
        path: PathBuf,
        /// Source [`serde_json::Error`].
        source: serde_json::Error,
    },
}

/// Result alias for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
