//! Loads `AgentConfigEntry` values from a single file or a directory of
//! files, isolating per-file parse failures so one malformed config doesn't
//! prevent the rest of the fleet from loading.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::AgentConfigEntry;

/// One file's worth of failures, paired with the path that produced them.
#[derive(Debug)]
pub struct ConfigLoadFailure {
    /// The file that failed to load.
    pub path: PathBuf,
    /// Why it failed.
    pub error: ConfigError,
}

/// Result of loading a directory: the entries that parsed successfully,
/// plus the failures encountered along the way.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully parsed entries.
    pub entries: Vec<AgentConfigEntry>,
    /// Files that failed to parse, with their errors.
    pub failures: Vec<ConfigLoadFailure>,
}

/// Loads one config file, which may hold either a single config object or a
/// JSON array of them.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file can't be read, or
/// [`ConfigError::Parse`] if its contents aren't valid JSON or don't decode
/// into one or more [`AgentConfigEntry`] values.
pub async fn load_file(path: &Path) -> ConfigResult<Vec<AgentConfigEntry>> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ConfigError::Io {
        path: path.to_owned(),
        source,
    })?;

    let value: Value = serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })?;

    let decode = |value: Value| -> Result<AgentConfigEntry, serde_json::Error> { serde_json::from_value(value) };

    match value {
        Value::Array(items) => items
            .into_iter()
            .map(decode)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            }),
        other => decode(other)
            .map(|entry| vec![entry])
            .map_err(|source| ConfigError::Parse {
                path: path.to_owned(),
                source,
            }),
    }
}

/// Loads every `*.json` file directly under `dir`, one file at a time.
/// A file that fails to load is recorded in [`LoadOutcome::failures`] and
/// logged; loading continues with the remaining files.
pub async fn load_dir(dir: &Path) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(source) => {
            outcome.failures.push(ConfigLoadFailure {
                path: dir.to_owned(),
                error: ConfigError::Io {
                    path: dir.to_owned(),
                    source,
                },
            });
            return outcome;
        }
    };

    loop {
        let next = match read_dir.next_entry().await {
            Ok(next) => next,
            Err(source) => {
                outcome.failures.push(ConfigLoadFailure {
                    path: dir.to_owned(),
                    error: ConfigError::Io {
                        path: dir.to_owned(),
                        source,
                    },
                });
                break;
            }
        };
        let Some(entry) = next else { break };
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        match load_file(&path).await {
            Ok(mut entries) => outcome.entries.append(&mut entries),
            Err(error) => {
                warn!(path = %path.display(), error = %error, "failed to load agent config");
                outcome.failures.push(ConfigLoadFailure { path, error });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn temp_dir() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("agent-config-{}", Uuid::new_v4()));
        path
    }

    #[tokio::test]
    async fn loads_single_object_file() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("a.json");
        tokio::fs::write(&file, json!({"className": "Foo", "id": "a"}).to_string())
            .await
            .unwrap();

        let entries = load_file(&file).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].class_name, "Foo");
    }

    #[tokio::test]
    async fn loads_array_file() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("fleet.json");
        tokio::fs::write(
            &file,
            json!([{"className": "Foo", "id": "a"}, {"className": "Bar", "id": "b"}]).to_string(),
        )
        .await
        .unwrap();

        let entries = load_file(&file).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn malformed_file_does_not_prevent_others_from_loading() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("good.json"), json!({"className": "Foo", "id": "a"}).to_string())
            .await
            .unwrap();
        tokio::fs::write(dir.join("bad.json"), "{ not json")
            .await
            .unwrap();

        let outcome = load_dir(&dir).await;
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
    }
}
