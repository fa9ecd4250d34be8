use super::lifecycle::TokenLifecycle;
use super::state::SessionError;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

type RefreshResult = Result<Option<String>, SessionError>;

#[derive(Clone)]
pub struct RefreshBus {
    tx: mpsc::UnboundedSender<RefreshRequest>,
}

pub(crate) struct RefreshRequest {
    respond_to: Option<oneshot::Sender<RefreshResult>>,
}

impl RefreshBus {
    pub fn trigger(&self) {
        let _ = self.tx.send(RefreshRequest { respond_to: None });
    }

    pub async fn refresh_now(&self) -> RefreshResult {
        let (tx, rx) = oneshot::channel();
        if self
            .tx
            .send(RefreshRequest {
                respond_to: Some(tx),
            })
            .is_err()
        {
            return Err(SessionError::WorkerUnavailable);
        }
        rx.await.unwrap_or(Err(SessionError::WorkerUnavailable))
    }
}

/// Runs refresh cycles one after another: once at start, then once per request.
pub struct RefreshWorker {
    lifecycle: Arc<TokenLifecycle>,
    rx: mpsc::UnboundedReceiver<RefreshRequest>,
}

impl RefreshWorker {
    pub async fn run(mut self) {
        // Failures are already on the hub's error channel.
        let _ = self.lifecycle.refresh().await;

        while let Some(req) = self.rx.recv().await {
            let result = self.lifecycle.refresh().await;
            if let Some(tx) = req.respond_to {
                let _ = tx.send(result);
            }
        }
        debug!("refresh bus closed; worker exiting");
    }
}

/// Builds a bus and the worker that serves it. The caller chooses the runtime
/// the worker runs on.
pub fn refresh_channel(lifecycle: Arc<TokenLifecycle>) -> (RefreshBus, RefreshWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RefreshBus { tx }, RefreshWorker { lifecycle, rx })
}

/// Must be called from within a Tokio runtime.
pub fn spawn_refresh_worker(lifecycle: Arc<TokenLifecycle>) -> RefreshBus {
    let (bus, worker) = refresh_channel(lifecycle);
    tokio::spawn(worker.run());
    bus
}
