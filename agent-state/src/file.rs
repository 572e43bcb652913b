//! File-backed `StateService`: one JSON file per key under a root directory.

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::{StateError, StateResult, StateService};

/// Stores each key as `<root>/<key>.json`, overwriting on every `put`.
pub struct FileStateService {
    root: PathBuf,
}

impl FileStateService {
    /// Opens (creating if necessary) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures creating the root directory.
    pub async fn open(root: impl Into<PathBuf>) -> StateResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> StateResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(StateError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl StateService for FileStateService {
    async fn get(&self, key: &str) -> StateResult<Option<Value>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn put(&self, key: &str, value: Value) -> StateResult<()> {
        let path = self.path_for(key)?;
        let bytes = serde_json::to_vec(&value)?;
        fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> StateResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn keys(&self) -> StateResult<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(stripped) = entry.file_name().to_str().and_then(|name| name.strip_suffix(".json")) {
                keys.push(stripped.to_owned());
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    async fn temp_store() -> FileStateService {
        let mut path = std::env::temp_dir();
        path.push(format!("agent-state-{}", Uuid::new_v4()));
        FileStateService::open(path).await.unwrap()
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let store = temp_store().await;
        store.put("k", json!({"v": 1})).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = temp_store().await;
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = temp_store().await;
        store.put("k", json!(1)).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let store = temp_store().await;
        assert!(store.get("../escape").await.is_err());
    }

    #[tokio::test]
    async fn keys_lists_stored_entries() {
        let store = temp_store().await;
        store.put("a", json!(1)).await.unwrap();
        store.put("b", json!(2)).await.unwrap();
        let mut keys = store.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a".to_owned(), "b".to_owned()]);
    }
}
