use super::{normalize, KeyValueStore, StoreError};
use async_trait::async_trait;

const KEYRING_SERVICE: &str = "app.audioguide.client";

/// Token cache in the OS keychain / secret service, one entry per key.
#[derive(Clone)]
pub struct KeyringStore {
    service: &'static str,
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: KEYRING_SERVICE,
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, StoreError> {
        keyring::Entry::new(self.service, key).map_err(classify)
    }

    pub fn is_available(&self) -> bool {
        let Ok(entry) = self.entry(super::AUTH_TOKEN_KEY) else {
            return false;
        };

        match entry.get_password() {
            Ok(_) => true,
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(_)) => true,
            Err(keyring::Error::Ambiguous(_)) => true,
            Err(_) => false,
        }
    }
}

fn classify(err: keyring::Error) -> StoreError {
    match err {
        keyring::Error::NoStorageAccess(e) => StoreError::Unavailable(e.to_string()),
        keyring::Error::PlatformFailure(e) => StoreError::Unavailable(e.to_string()),
        other => StoreError::Backend(other.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for KeyringStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entry = self.entry(key)?;

        match entry.get_password() {
            Ok(value) => Ok(normalize(&value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            // Unreadable or duplicated entries are a cache miss, not an outage.
            Err(keyring::Error::BadEncoding(_)) => Ok(None),
            Err(keyring::Error::Ambiguous(_)) => Ok(None),
            Err(e) => Err(classify(e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = self.entry(key)?;
        entry.set_password(value.trim()).map_err(classify)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let entry = self.entry(key)?;
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(classify(e)),
        }
    }
}
