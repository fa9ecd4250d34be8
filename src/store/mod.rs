//! Persistent key-value storage behind the session token cache.
//!
//! The host store is asynchronous and may fail at any call. Callers decide how
//! to recover; the adapters only classify the failure.

mod memory;

#[cfg(feature = "desktop")]
mod app_store;
#[cfg(feature = "desktop")]
mod keyring_store;

pub use memory::MemoryStore;

#[cfg(feature = "desktop")]
pub use app_store::AppStore;
#[cfg(feature = "desktop")]
pub use keyring_store::KeyringStore;

use async_trait::async_trait;
use thiserror::Error;

/// The only persisted key: the raw signed session token.
pub const AUTH_TOKEN_KEY: &str = "AUTH_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Blank values read back as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub(crate) fn normalize(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
