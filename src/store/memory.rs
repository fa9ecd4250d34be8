use super::{normalize, KeyValueStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Process-local store. Nothing survives a restart, so every launch starts
/// from the ticket again.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let guard = self.values.lock().await;
        Ok(guard.get(key).and_then(|v| normalize(v)))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut guard = self.values.lock().await;
        match normalize(value) {
            Some(value) => {
                guard.insert(key.to_string(), value);
            }
            None => {
                guard.remove(key);
            }
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.values.lock().await.remove(key);
        Ok(())
    }
}
