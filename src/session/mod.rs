//! The session token lifecycle: one authoritative token state per process,
//! refreshed from the cache or a launch ticket and broadcast to subscribers.

mod hub;
mod lifecycle;
mod refresh_bus;
mod state;

pub use hub::{NotificationHub, SubscriberId, Subscription};
pub use lifecycle::TokenLifecycle;
pub use refresh_bus::{refresh_channel, spawn_refresh_worker, RefreshBus, RefreshWorker};
pub use state::{SessionError, TokenState};
