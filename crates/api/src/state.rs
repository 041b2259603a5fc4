//! Shared application state for the Axum relay server.

use relay_notifier::Forwarder;
use relay_store::NotificationStore;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub store: NotificationStore,
    pub forwarder: Forwarder,
}

impl AppState {
    pub fn new(store: NotificationStore, forwarder: Forwarder) -> Self {
        Self { store, forwarder }
    }
}
