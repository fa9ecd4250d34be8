use crate::api::RedemptionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// `loaded == false` means "unknown yet"; `token == None` once loaded means
/// "no valid session".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenState {
    pub loaded: bool,
    pub token: Option<String>,
}

impl TokenState {
    pub fn loaded(token: Option<String>) -> Self {
        Self {
            loaded: true,
            token,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session refresh failed: {0}")]
    Redemption(#[from] RedemptionError),
    #[error("session refresh worker is not running")]
    WorkerUnavailable,
}
