//! Shared handler state

use std::sync::Arc;

use observability::HttpTelemetry;

use crate::effects::SideEffects;
use crate::store::UserStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub effects: SideEffects,
    pub telemetry: Arc<HttpTelemetry>,
}

impl AppState {
    pub fn new(store: Arc<UserStore>, effects: SideEffects, telemetry: Arc<HttpTelemetry>) -> Self {
        Self {
            store,
            effects,
            telemetry,
        }
    }

    /// Refresh the active-users gauge from the store
    pub fn publish_user_count(&self) {
        self.telemetry.set_active_users(self.store.count());
    }
}
