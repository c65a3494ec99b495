//! Small key/value store for per-device flags.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::StoreError;

#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Typed read. A stored value of the wrong shape reads as absent.
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn FlagStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(typed) => Ok(Some(typed)),
        Err(e) => {
            warn!(key = %key, error = %e, "Ignoring malformed flag value");
            Ok(None)
        }
    }
}

pub async fn set_typed<T: Serialize + Sync>(
    store: &dyn FlagStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(value)?).await
}

#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        self.values.lock().map_err(|_| StoreError::Unavailable)
    }
}

#[async_trait]
impl FlagStore for MemoryFlagStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values()?.remove(key);
        Ok(())
    }
}

/// One JSON object on disk holding every flag.
#[derive(Debug)]
pub struct FileFlagStore {
    path: PathBuf,
    values: tokio::sync::Mutex<BTreeMap<String, Value>>,
}

impl FileFlagStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Discarding corrupt flag file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            values: tokio::sync::Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(values)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl FlagStore for FileFlagStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().await;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Counter {
        count: u32,
    }

    #[tokio::test]
    async fn test_memory_typed_round_trip() {
        let store = MemoryFlagStore::new();
        set_typed(&store, "counter", &Counter { count: 3 }).await.unwrap();
        let counter: Option<Counter> = get_typed(&store, "counter").await.unwrap();
        assert_eq!(counter, Some(Counter { count: 3 }));

        store.remove("counter").await.unwrap();
        let counter: Option<Counter> = get_typed(&store, "counter").await.unwrap();
        assert_eq!(counter, None);
    }

    #[tokio::test]
    async fn test_malformed_value_reads_as_absent() {
        let store = MemoryFlagStore::new();
        store.set("counter", json!("five")).await.unwrap();
        let counter: Option<Counter> = get_typed(&store, "counter").await.unwrap();
        assert!(counter.is_none());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        {
            let store = FileFlagStore::open(&path).await.unwrap();
            store.set("seen", json!(true)).await.unwrap();
        }
        let reopened = FileFlagStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("seen").await.unwrap(), Some(json!(true)));
    }

    #[tokio::test]
    async fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flags.json");
        tokio::fs::write(&path, b"[1,2").await.unwrap();
        let store = FileFlagStore::open(&path).await.unwrap();
        assert_eq!(store.get("seen").await.unwrap(), None);
    }
}
