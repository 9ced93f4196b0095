use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::Mutex;

use super::{ArtifactKey, ArtifactStore, StoreError};

/// Process-local store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub async fn len(&self) -> usize {
        self.artifacts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.artifacts.lock().await.is_empty()
    }
}

impl ArtifactStore for MemoryStore {
    async fn put(&self, key: &ArtifactKey, value: &Value) -> Result<(), StoreError> {
        self.artifacts
            .lock()
            .await
            .insert(key.as_key(), value.clone());
        Ok(())
    }

    async fn get(&self, key: &ArtifactKey) -> Result<Option<Value>, StoreError> {
        Ok(self.artifacts.lock().await.get(&key.as_key()).cloned())
    }

    async fn remove(&self, key: &ArtifactKey) -> Result<bool, StoreError> {
        Ok(self.artifacts.lock().await.remove(&key.as_key()).is_some())
    }
}
