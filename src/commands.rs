use crate::api::{GuideObject, ObjectMedia};
use crate::app::AppState;
use crate::redact::redact_secrets;
use crate::session::SessionError;
use crate::types::{IpcError, IpcErrorCode, IpcResult, SessionPayload};
use tauri::State;

type CommandResult<T> = Result<T, IpcError>;

fn payload(state: &AppState) -> SessionPayload {
    SessionPayload {
        state: state.lifecycle.current_state(),
        view: state.lifecycle.view(),
    }
}

fn session_token<T>(state: &AppState) -> Result<String, IpcResult<T>> {
    state
        .lifecycle
        .current_state()
        .token
        .ok_or_else(|| IpcResult::err(IpcErrorCode::NoSession, "No active session."))
}

#[tauri::command]
pub async fn session_get_state(state: State<'_, AppState>) -> CommandResult<SessionPayload> {
    Ok(payload(&state))
}

#[tauri::command]
pub async fn session_refresh_now(
    state: State<'_, AppState>,
) -> CommandResult<IpcResult<SessionPayload>> {
    match state.refresh.refresh_now().await {
        Ok(_) => Ok(IpcResult::ok(payload(&state))),
        Err(SessionError::WorkerUnavailable) => Ok(IpcResult::err(
            IpcErrorCode::Unavailable,
            "Session worker is not available.",
        )),
        Err(err) => Ok(IpcResult::err(
            IpcErrorCode::Session,
            redact_secrets(&err.to_string()).to_string(),
        )),
    }
}

#[tauri::command]
pub async fn session_sign_out(state: State<'_, AppState>) -> CommandResult<IpcResult<()>> {
    state.lifecycle.sign_out().await;
    Ok(IpcResult::ok(()))
}

#[tauri::command]
pub async fn object_get(
    state: State<'_, AppState>,
    code: String,
) -> CommandResult<IpcResult<GuideObject>> {
    let token = match session_token(&state) {
        Ok(token) => token,
        Err(err) => return Ok(err),
    };
    match state.api.fetch_object(&token, &code).await {
        Ok(object) => Ok(IpcResult::ok(object)),
        Err(err) => Ok(IpcResult::err(
            IpcErrorCode::from(&err),
            redact_secrets(&err.to_string()).to_string(),
        )),
    }
}

#[tauri::command]
pub async fn object_media_urls(
    state: State<'_, AppState>,
    code: String,
    cover_index: Option<i64>,
) -> CommandResult<IpcResult<ObjectMedia>> {
    let token = match session_token(&state) {
        Ok(token) => token,
        Err(err) => return Ok(err),
    };
    Ok(IpcResult::ok(state.api.object_media(&token, &code, cover_index)))
}
