pub mod api;
pub mod config;
pub mod launch;
mod redact;
pub mod session;
pub mod store;
pub mod token;
pub mod view;

#[cfg(feature = "desktop")]
mod app;
#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
pub mod types;

#[cfg(test)]
mod test_support;

pub use redact::{redact_secrets, redact_ticket};

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    app::run();
}
