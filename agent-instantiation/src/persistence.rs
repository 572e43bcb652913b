//! Durable storage for instantiation entries, so a restart can rebuild the
//! entry table before `boot()` wakes it.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use agent_primitives::AgentId;

/// A persisted instantiation record: `{ className, params, key }` (§6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EntryRecord {
    /// The agent id this entry is keyed under.
    pub key: AgentId,
    /// The resolvable class name.
    pub class_name: String,
    /// The JSON config handed to the constructor.
    pub params: Value,
}

/// Error surfaced by an [`InstantiationPersistence`] backend.
#[derive(Debug, Error)]
#[error("instantiation persistence failure: {reason}")]
pub struct InstantiationPersistenceError {
    /// Human-readable explanation for logging.
    pub reason: String,
}

/// Persists the Instantiation Service's entry table. An instantiation
/// service configured without a backend keeps entries only in memory for
/// the life of the process.
#[async_trait]
pub trait InstantiationPersistence: Send + Sync {
    /// Upserts an entry record, overwriting any existing record for the same
    /// key.
    async fn save(&self, record: &EntryRecord) -> Result<(), InstantiationPersistenceError>;

    /// Removes an entry record. Idempotent.
    async fn remove(&self, key: &AgentId) -> Result<(), InstantiationPersistenceError>;

    /// Loads a single entry record by key.
    async fn load(&self, key: &AgentId) -> Result<Option<EntryRecord>, InstantiationPersistenceError>;

    /// Loads every persisted entry record, for `boot()`.
    async fn load_all(&self) -> Result<Vec<EntryRecord>, InstantiationPersistenceError>;

    /// Removes every persisted entry record.
    async fn clear_all(&self) -> Result<(), InstantiationPersistenceError>;
}
