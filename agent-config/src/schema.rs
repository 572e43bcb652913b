//! The typed, validated form of a JSON agent config (§6).

use serde::Deserialize;
use serde_json::Value;

/// A single agent's config, prior to being handed to
/// `InstantiationService::register`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfigEntry {
    /// The class name the Instantiation Service resolves at `init` time.
    pub class_name: String,
    /// The agent id to register under. Configs loaded as part of an array
    /// file without an explicit id are rejected by the caller, which treats
    /// a missing id as a validation failure rather than synthesizing one.
    pub id: Option<String>,
    /// Name of the authorizor capability to attach, if any.
    pub authorizor: Option<String>,
    /// Backend-specific state subtree, opaque to this crate.
    #[serde(default)]
    pub state: Value,
    /// Backend-specific transport subtree, opaque to this crate.
    #[serde(default)]
    pub transport: Value,
    /// Backend-specific scheduler subtree, opaque to this crate.
    #[serde(default)]
    pub scheduler: Value,
    /// Free-form params object handed to the agent's constructor.
    #[serde(default)]
    pub params: Value,
}
