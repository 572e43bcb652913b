//! Typed, validated loading of agent configs (§6) into
//! [`AgentConfigEntry`] values fed to `InstantiationService::register`.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_dir, load_file, ConfigLoadFailure, LoadOutcome};
pub use schema::AgentConfigEntry;
