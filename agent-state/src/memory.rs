//! In-memory `StateService`, for tests and single-process demos.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{StateResult, StateService};

/// A `tokio::sync::RwLock<HashMap<String, Value>>`-backed store. State does
/// not survive past the process; restarting loses everything.
#[derive(Default)]
pub struct InMemoryStateService {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryStateService {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateService for InMemoryStateService {
    async fn get(&self, key: &str) -> StateResult<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> StateResult<()> {
        self.values.write().await.insert(key.to_owned(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StateResult<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> StateResult<Vec<String>> {
        Ok(self.values.read().await.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = InMemoryStateService::new();
        store.put("k", json!({"v": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = InMemoryStateService::new();
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let store = InMemoryStateService::new();
        store.put("k", json!(1)).await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
