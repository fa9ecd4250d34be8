use super::state::{SessionError, TokenState};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type TokenCallback = Box<dyn Fn(Option<&str>) + Send + Sync>;
type ErrorCallback = Box<dyn Fn(&SessionError) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

struct Subscriber<C> {
    id: SubscriberId,
    active: AtomicBool,
    // Highest publish generation delivered so far. A subscriber never sees an
    // older state after a newer one.
    seen: AtomicU64,
    callback: C,
}

impl<C> Subscriber<C> {
    fn new(id: SubscriberId, callback: C) -> Arc<Self> {
        Arc::new(Self {
            id,
            active: AtomicBool::new(true),
            seen: AtomicU64::new(0),
            callback,
        })
    }

    fn claim(&self, generation: u64) -> bool {
        self.active.load(Ordering::Acquire) && self.seen.fetch_max(generation, Ordering::AcqRel) < generation
    }
}

#[derive(Default)]
struct HubState {
    token_state: TokenState,
    generation: u64,
    tokens: Vec<Arc<Subscriber<TokenCallback>>>,
    errors: Vec<Arc<Subscriber<ErrorCallback>>>,
}

/// Owns the published [`TokenState`] and the callbacks interested in it.
///
/// Callbacks run synchronously on the publishing task, outside the hub's lock,
/// so a callback may subscribe or unsubscribe without deadlocking.
#[derive(Default)]
pub struct NotificationHub {
    next_id: AtomicU64,
    inner: Mutex<HubState>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> SubscriberId {
        SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn state(&self) -> TokenState {
        self.lock().token_state.clone()
    }

    /// Registers a token-change callback.
    ///
    /// If a state is already published the callback first receives it,
    /// synchronously, before this call returns.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let subscriber = Subscriber::new(id, Box::new(callback) as TokenCallback);

        let replay = {
            let mut inner = self.lock();
            inner.tokens.push(subscriber.clone());
            inner
                .token_state
                .loaded
                .then(|| (inner.generation, inner.token_state.token.clone()))
        };

        if let Some((generation, token)) = replay {
            if subscriber.claim(generation) {
                (subscriber.callback)(token.as_deref());
            }
        }

        Subscription {
            id,
            hub: Arc::downgrade(self),
        }
    }

    /// Registers a callback for failed refresh cycles. Failures are not replayed.
    pub fn subscribe_errors<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&SessionError) + Send + Sync + 'static,
    {
        let id = self.next_id();
        let subscriber = Subscriber::new(id, Box::new(callback) as ErrorCallback);
        self.lock().errors.push(subscriber);
        Subscription {
            id,
            hub: Arc::downgrade(self),
        }
    }

    /// No-op for unknown or already removed ids.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut inner = self.lock();
        inner.tokens.retain(|s| {
            if s.id == id {
                s.active.store(false, Ordering::Release);
                false
            } else {
                true
            }
        });
        inner.errors.retain(|s| {
            if s.id == id {
                s.active.store(false, Ordering::Release);
                false
            } else {
                true
            }
        });
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        let inner = self.lock();
        inner.tokens.len() + inner.errors.len()
    }

    /// Enters the recomputing state. Subscribers are not notified.
    pub(crate) fn mark_loading(&self) {
        self.lock().token_state.loaded = false;
    }

    pub(crate) fn publish(&self, token: Option<String>) {
        let (generation, subscribers) = {
            let mut inner = self.lock();
            inner.generation += 1;
            inner.token_state = TokenState::loaded(token.clone());
            (inner.generation, inner.tokens.clone())
        };

        for subscriber in subscribers {
            if subscriber.claim(generation) {
                (subscriber.callback)(token.as_deref());
            }
        }
    }

    pub(crate) fn publish_error(&self, error: &SessionError) {
        let subscribers = self.lock().errors.clone();
        for subscriber in subscribers {
            if subscriber.active.load(Ordering::Acquire) {
                (subscriber.callback)(error);
            }
        }
    }
}

/// Handle returned by [`NotificationHub::subscribe`].
///
/// Dropping it does not unsubscribe.
#[must_use = "keep the Subscription to unsubscribe later"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: SubscriberId,
    hub: Weak<NotificationHub>,
}

impl Subscription {
    /// Safe to call more than once, and after the hub is gone.
    pub fn unsubscribe(&self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}
