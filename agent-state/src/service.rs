//! The `StateService` trait the core depends on (§2, §6).

use async_trait::async_trait;
use serde_json::Value;

use crate::StateResult;

/// Durable per-key JSON storage. Every instantiation entry, subscription
/// table, and scheduled-task queue in this workspace is, at the storage
/// layer, just a JSON value under a well-known key in one of these.
///
/// The core assumes at-least-atomic single-key writes and implements no
/// multi-key transactions of its own (§5).
#[async_trait]
pub trait StateService: Send + Sync {
    /// Reads the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StateResult<Option<Value>>;

    /// Overwrites the value stored under `key`.
    async fn put(&self, key: &str, value: Value) -> StateResult<()>;

    /// Removes the value stored under `key`. Idempotent.
    async fn delete(&self, key: &str) -> StateResult<()>;

    /// Lists every key currently stored.
    async fn keys(&self) -> StateResult<Vec<String>>;
}
