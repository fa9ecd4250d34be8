use crate::api::GuideApiClient;
use crate::commands;
use crate::config::{ClientConfig, TokenStoreKind};
use crate::launch::LaunchContext;
use crate::redact::redact_secrets;
use crate::session::{refresh_channel, NotificationHub, RefreshBus, TokenLifecycle, TokenState};
use crate::store::{AppStore, KeyValueStore, KeyringStore, MemoryStore};
use crate::types::{IpcError, IpcErrorCode, SessionPayload};
use crate::view::SessionView;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, EventTarget, Manager, Runtime};
use tracing::{debug, info, warn};

const SESSION_CHANGED_EVENT: &str = "session:changed";
const SESSION_FAILED_EVENT: &str = "session:failed";

pub struct AppState {
  pub api: Arc<GuideApiClient>,
  pub lifecycle: Arc<TokenLifecycle>,
  pub refresh: RefreshBus,
}

fn setup_error(e: impl std::error::Error + Send + Sync + 'static) -> tauri::Error {
  let err: Box<dyn std::error::Error> = Box::new(e);
  tauri::Error::Setup(err.into())
}

fn open_token_store<R: Runtime>(
  app: &AppHandle<R>,
  kind: TokenStoreKind,
) -> tauri_plugin_store::Result<Arc<dyn KeyValueStore>> {
  match kind {
    TokenStoreKind::App => Ok(Arc::new(AppStore::new(app)?)),
    TokenStoreKind::Keyring => {
      let keyring = KeyringStore::new();
      if keyring.is_available() {
        return Ok(Arc::new(keyring));
      }
      warn!("OS keychain/secret service is unavailable; caching the session token in the app store");
      Ok(Arc::new(AppStore::new(app)?))
    }
    TokenStoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
  }
}

fn forward_session_events<R: Runtime>(app: &AppHandle<R>, hub: &Arc<NotificationHub>) {
  let handle = app.clone();
  let _ = hub.subscribe(move |token| {
    let state = TokenState::loaded(token.map(str::to_string));
    let view = SessionView::derive(&state, None);
    debug!(has_session = view.has_session(), "forwarding session change");
    let _ = handle.emit_to(
      EventTarget::any(),
      SESSION_CHANGED_EVENT,
      SessionPayload { state, view },
    );
  });

  let handle = app.clone();
  let _ = hub.subscribe_errors(move |err| {
    let error = IpcError {
      code: IpcErrorCode::Session.into(),
      message: redact_secrets(&err.to_string()).to_string(),
    };
    let _ = handle.emit_to(EventTarget::any(), SESSION_FAILED_EVENT, error);
  });
}

pub fn run() {
  tauri::Builder::default()
    .plugin(tauri_plugin_store::Builder::default().build())
    .invoke_handler(tauri::generate_handler![
      commands::session_get_state,
      commands::session_refresh_now,
      commands::session_sign_out,
      commands::object_get,
      commands::object_media_urls,
    ])
    .setup(|app| {
      let app_handle = app.handle().clone();
      let config = ClientConfig::from_env().map_err(setup_error)?;
      let store = open_token_store(&app_handle, config.token_store).map_err(setup_error)?;
      let api = Arc::new(GuideApiClient::new(&config).map_err(setup_error)?);

      let launch = LaunchContext::from_args(std::env::args().skip(1));
      info!(
        api_url = %config.api_url,
        has_ticket = launch.ticket().is_some(),
        "starting session lifecycle"
      );

      let hub = Arc::new(NotificationHub::new());
      forward_session_events(&app_handle, &hub);

      let lifecycle = Arc::new(TokenLifecycle::new(store, api.clone(), launch, hub));
      let (refresh, worker) = refresh_channel(lifecycle.clone());
      tauri::async_runtime::spawn(worker.run());

      app.manage(AppState {
        api,
        lifecycle,
        refresh,
      });
      Ok(())
    })
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
