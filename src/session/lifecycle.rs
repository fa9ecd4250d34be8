use super::hub::NotificationHub;
use super::state::{SessionError, TokenState};
use crate::api::{RedemptionError, TicketRedeemer};
use crate::launch::LaunchContext;
use crate::store::{KeyValueStore, AUTH_TOKEN_KEY};
use crate::token;
use crate::view::SessionView;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Establishes, caches, validates and broadcasts the session token.
///
/// The manager is the only writer of the hub's [`TokenState`]. Refresh cycles
/// never overlap: a second caller waits for the running cycle and then runs
/// its own.
pub struct TokenLifecycle {
    store: Arc<dyn KeyValueStore>,
    redeemer: Arc<dyn TicketRedeemer>,
    launch: LaunchContext,
    hub: Arc<NotificationHub>,
    in_flight: tokio::sync::Mutex<()>,
    last_error: Mutex<Option<SessionError>>,
}

impl TokenLifecycle {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        redeemer: Arc<dyn TicketRedeemer>,
        launch: LaunchContext,
        hub: Arc<NotificationHub>,
    ) -> Self {
        Self {
            store,
            redeemer,
            launch,
            hub,
            in_flight: tokio::sync::Mutex::new(()),
            last_error: Mutex::new(None),
        }
    }

    pub fn hub(&self) -> &Arc<NotificationHub> {
        &self.hub
    }

    pub fn current_state(&self) -> TokenState {
        self.hub.state()
    }

    /// The failure of the most recent cycle, cleared when a cycle starts.
    pub fn last_error(&self) -> Option<SessionError> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn view(&self) -> SessionView {
        SessionView::derive(&self.current_state(), self.last_error().as_ref())
    }

    fn set_last_error(&self, error: Option<SessionError>) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Runs one refresh cycle and publishes its outcome.
    ///
    /// On failure nothing is published on the token channel; the error goes to
    /// the hub's error subscribers and back to the caller.
    pub async fn refresh(&self) -> Result<Option<String>, SessionError> {
        let _guard = self.in_flight.lock().await;
        self.set_last_error(None);
        self.hub.mark_loading();

        let cached = self.read_cached().await;
        let decoded = token::decode(cached.as_deref());

        let effective = if token::is_valid(decoded.as_ref()) {
            debug!("cached session token is still valid");
            decoded.map(|d| d.raw)
        } else {
            if cached.is_some() {
                debug!(decodable = decoded.is_some(), "cached session token is unusable");
            }
            match self.redeem_launch_ticket().await {
                Ok(token) => token,
                Err(err) => {
                    warn!(error = %err, "session refresh failed");
                    self.set_last_error(Some(err.clone()));
                    self.hub.publish_error(&err);
                    return Err(err);
                }
            }
        };

        info!(has_session = effective.is_some(), "session state published");
        self.hub.publish(effective.clone());
        Ok(effective)
    }

    /// Forgets the persisted token and publishes "no session".
    pub async fn sign_out(&self) {
        let _guard = self.in_flight.lock().await;
        if let Err(err) = self.store.remove(AUTH_TOKEN_KEY).await {
            warn!(error = %err, "failed to clear persisted session token");
        }
        self.set_last_error(None);
        self.hub.publish(None);
    }

    async fn read_cached(&self) -> Option<String> {
        match self.store.get(AUTH_TOKEN_KEY).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to read cached session token; treating as cache miss");
                None
            }
        }
    }

    async fn redeem_launch_ticket(&self) -> Result<Option<String>, SessionError> {
        let Some(ticket) = self.launch.ticket() else {
            info!("no valid cached session and no launch ticket");
            return Ok(None);
        };

        match self.redeemer.redeem(ticket).await {
            Ok(token) => {
                if let Err(err) = self.store.set(AUTH_TOKEN_KEY, &token).await {
                    warn!(error = %err, "failed to persist session token; using it for this session only");
                }
                info!("launch ticket redeemed");
                Ok(Some(token))
            }
            Err(RedemptionError::AlreadyRedeemed) => {
                info!("launch ticket was already redeemed");
                Ok(None)
            }
            Err(err) => Err(SessionError::Redemption(err)),
        }
    }
}
