//! Composition root: dispatchers, gate, telemetry and router

use std::sync::Arc;
use std::time::{Duration, Instant};

use admission::{Admission, AdmissionGate};
use axum::Router;
use contracts::{DispatchConfig, ServiceBlueprint};
use dispatcher::{create_dispatcher, DispatcherError, Dispatcher, DrainReport};
use observability::{HttpTelemetry, TelemetryError};
use thiserror::Error;
use tracing::{info, instrument};

use crate::effects::SideEffects;
use crate::rejection::RejectionRecorder;
use crate::router::build_router;
use crate::state::AppState;
use crate::store::UserStore;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Dispatcher(#[from] DispatcherError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// The three dispatchers, owned for the life of the process
pub struct Dispatchers {
    audit: Dispatcher,
    notifications: Dispatcher,
    errors: Dispatcher,
}

impl Dispatchers {
    pub fn new(audit: Dispatcher, notifications: Dispatcher, errors: Dispatcher) -> Self {
        Self {
            audit,
            notifications,
            errors,
        }
    }

    pub async fn from_config(config: &DispatchConfig) -> Result<Self, DispatcherError> {
        Ok(Self::new(
            create_dispatcher(&config.audit).await?,
            create_dispatcher(&config.notifications).await?,
            create_dispatcher(&config.errors).await?,
        ))
    }

    pub fn side_effects(&self) -> SideEffects {
        SideEffects::new(
            self.audit.handle(),
            self.notifications.handle(),
            self.errors.handle(),
        )
    }

    /// Drain audit, then notifications, then errors, within one deadline
    #[instrument(name = "dispatchers_shutdown", skip(self))]
    pub async fn shutdown(self, timeout: Duration) -> Vec<DrainReport> {
        let started = Instant::now();
        let mut reports = Vec::with_capacity(3);
        for dispatcher in [self.audit, self.notifications, self.errors] {
            let remaining = timeout.saturating_sub(started.elapsed());
            reports.push(dispatcher.drain(remaining).await);
        }
        reports
    }
}

/// A fully wired service, ready to serve
pub struct Service {
    pub router: Router,
    pub state: AppState,
    /// Admission middleware state; `admission.gate()` allows live reconfiguration
    pub admission: Admission,
    pub dispatchers: Dispatchers,
}

impl Service {
    /// Create dispatchers from configuration and wire everything
    pub async fn build(blueprint: &ServiceBlueprint) -> Result<Self, BootstrapError> {
        let dispatchers = Dispatchers::from_config(&blueprint.dispatch).await?;
        Self::assemble(blueprint, dispatchers)
    }

    /// Wire pre-built dispatchers (e.g. memory sinks)
    pub fn assemble(
        blueprint: &ServiceBlueprint,
        dispatchers: Dispatchers,
    ) -> Result<Self, BootstrapError> {
        let telemetry = Arc::new(HttpTelemetry::new()?);
        let effects = dispatchers.side_effects();
        let state = AppState::new(Arc::new(UserStore::new()), effects, Arc::clone(&telemetry));

        let gate = Arc::new(AdmissionGate::new(blueprint.rate_limit));
        let hook = Arc::new(RejectionRecorder::new(
            telemetry,
            dispatchers.errors.handle(),
        ));
        let admission = Admission::new(gate, hook);

        let router = build_router(
            state.clone(),
            admission.clone(),
            blueprint.server.request_timeout(),
        );
        info!(
            rate_per_sec = blueprint.rate_limit.rate_per_sec,
            burst = blueprint.rate_limit.burst,
            "Service assembled"
        );

        Ok(Self {
            router,
            state,
            admission,
            dispatchers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatcher::MemoryCapture;

    fn memory_dispatchers(capture: &MemoryCapture) -> Dispatchers {
        let spawn = |name: &str| {
            Dispatcher::spawn(capture.sink(name), Arc::new(capture.clone()), 16)
        };
        Dispatchers::new(spawn("audit"), spawn("notifications"), spawn("errors"))
    }

    #[tokio::test]
    async fn test_shutdown_with_unbounded_timeout_still_drains() {
        let capture = MemoryCapture::new();
        let dispatchers = memory_dispatchers(&capture);
        let effects = dispatchers.side_effects();
        effects.audit("CREATE", Some(1), "");
        effects.notify(1, "WELCOME", "User account created successfully");

        let reports = dispatchers.shutdown(Duration::MAX).await;
        assert_eq!(reports.len(), 3);
        assert!(reports.iter().all(|r| r.completed));
        assert_eq!(capture.written().len(), 2);
    }

    #[tokio::test]
    async fn test_shutdown_order_and_shared_deadline() {
        let capture = MemoryCapture::new();
        let reports = memory_dispatchers(&capture)
            .shutdown(Duration::from_secs(1))
            .await;
        let names: Vec<&str> = reports.iter().map(|r| r.dispatcher.as_str()).collect();
        assert_eq!(names, vec!["audit", "notifications", "errors"]);
        assert!(reports.iter().all(|r| r.elapsed < Duration::from_secs(1)));
    }
}
