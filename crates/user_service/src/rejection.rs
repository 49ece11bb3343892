//! Rejection side effects for the admission gate

use std::sync::Arc;

use admission::RejectionHook;
use axum::http::Method;
use contracts::DispatchPayload;
use dispatcher::DispatchHandle;
use observability::HttpTelemetry;

/// Counts the rejection and submits an error record
pub struct RejectionRecorder {
    telemetry: Arc<HttpTelemetry>,
    errors: DispatchHandle,
}

impl RejectionRecorder {
    pub fn new(telemetry: Arc<HttpTelemetry>, errors: DispatchHandle) -> Self {
        Self { telemetry, errors }
    }
}

impl RejectionHook for RejectionRecorder {
    fn on_rejected(&self, _method: &Method, path: &str) {
        self.telemetry.record_rate_limited();
        self.errors.submit(DispatchPayload::error(
            "rate_limit",
            None,
            format!("Rate limit exceeded for request: {path}"),
        ));
    }
}
