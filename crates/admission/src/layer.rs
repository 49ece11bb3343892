//! axum admission middleware
//!
//! Runs before anything else in the stack. A rejected request gets a 429 and
//! never reaches observation or the handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::gate::AdmissionGate;

/// Body of a rejection response
pub const REJECTION_BODY: &str = "Too Many Requests";

/// Side effect run for every rejected request
///
/// Must not block; implementations typically bump a counter and submit an
/// error record.
pub trait RejectionHook: Send + Sync {
    fn on_rejected(&self, method: &Method, path: &str);
}

/// Middleware state: the gate plus the rejection hook
#[derive(Clone)]
pub struct Admission {
    gate: Arc<AdmissionGate>,
    hook: Arc<dyn RejectionHook>,
}

impl Admission {
    pub fn new(gate: Arc<AdmissionGate>, hook: Arc<dyn RejectionHook>) -> Self {
        Self { gate, hook }
    }

    pub fn gate(&self) -> &Arc<AdmissionGate> {
        &self.gate
    }
}

/// Use with `axum::middleware::from_fn_with_state`
pub async fn admit(State(admission): State<Admission>, request: Request, next: Next) -> Response {
    if admission.gate.allow() {
        return next.run(request).await;
    }

    let path = request.uri().path();
    debug!(method = %request.method(), path, "Request rejected by admission gate");
    admission.hook.on_rejected(request.method(), path);
    (StatusCode::TOO_MANY_REQUESTS, REJECTION_BODY).into_response()
}
