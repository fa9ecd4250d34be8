use crate::api::ApiError;
use crate::session::TokenState;
use crate::view::SessionView;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcErrorCode {
    Session,
    Unavailable,
    NoSession,
    Unauthorized,
    NotFound,
    Network,
    Upstream,
}

impl From<IpcErrorCode> for String {
    fn from(code: IpcErrorCode) -> Self {
        match code {
            IpcErrorCode::Session => "SESSION".to_string(),
            IpcErrorCode::Unavailable => "UNAVAILABLE".to_string(),
            IpcErrorCode::NoSession => "NO_SESSION".to_string(),
            IpcErrorCode::Unauthorized => "UNAUTHORIZED".to_string(),
            IpcErrorCode::NotFound => "NOT_FOUND".to_string(),
            IpcErrorCode::Network => "NETWORK".to_string(),
            IpcErrorCode::Upstream => "UPSTREAM".to_string(),
        }
    }
}

impl From<&ApiError> for IpcErrorCode {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Unauthorized => Self::Unauthorized,
            ApiError::NotFound => Self::NotFound,
            ApiError::Network(_) => Self::Network,
            ApiError::Status(_) | ApiError::InvalidResponse(_) => Self::Upstream,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IpcResult<T> {
    Ok { ok: bool, value: T },
    Err { ok: bool, error: IpcError },
}

impl<T> IpcResult<T> {
    pub fn ok(value: T) -> Self {
        Self::Ok { ok: true, value }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Err {
            ok: false,
            error: IpcError {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

/// Payload of `session:changed` and of the session commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub state: TokenState,
    pub view: SessionView,
}
