use super::{normalize, KeyValueStore, StoreError};
use async_trait::async_trait;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tauri::Runtime;
use tauri_plugin_store::{Store, StoreBuilder};

const SESSION_STORE_FILE: &str = "audioguide-session.json";

/// Token cache backed by the app's store plugin file.
#[derive(Clone)]
pub struct AppStore<R: Runtime> {
  store: Arc<Store<R>>,
}

impl<R: Runtime> AppStore<R> {
  pub fn new(app: &tauri::AppHandle<R>) -> tauri_plugin_store::Result<Self> {
    let store = StoreBuilder::new(app, SESSION_STORE_FILE)
      .auto_save(Duration::from_millis(200))
      .build()?;
    Ok(Self { store })
  }

  fn flush(&self) -> Result<(), StoreError> {
    self
      .store
      .save()
      .map_err(|e| StoreError::Backend(e.to_string()))
  }
}

#[async_trait]
impl<R: Runtime> KeyValueStore for AppStore<R> {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let Some(value) = self.store.get(key) else {
      return Ok(None);
    };
    Ok(value.as_str().and_then(normalize))
  }

  // Written through immediately; the auto-save debounce only covers the
  // plugin's own bookkeeping.
  async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    self.store.set(key.to_string(), json!(value.trim()));
    self.flush()
  }

  async fn remove(&self, key: &str) -> Result<(), StoreError> {
    if self.store.delete(key.to_string()) {
      self.flush()?;
    }
    Ok(())
  }
}
