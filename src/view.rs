use crate::redact::redact_secrets;
use crate::session::{SessionError, TokenState};
use serde::{Deserialize, Serialize};

/// What the mini-app should show for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionView {
    Loading,
    NoSession,
    Failed {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
    Ready {
        token: String,
    },
}

impl SessionView {
    /// A failed cycle wins over the loading state, so the UI never waits on a
    /// refresh that already gave up.
    pub fn derive(state: &TokenState, last_error: Option<&SessionError>) -> Self {
        if let Some(err) = last_error {
            return Self::Failed {
                error_message: redact_secrets(&err.to_string()).into_owned(),
            };
        }
        if !state.loaded {
            return Self::Loading;
        }
        match &state.token {
            Some(token) => Self::Ready {
                token: token.clone(),
            },
            None => Self::NoSession,
        }
    }

    pub fn has_session(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
