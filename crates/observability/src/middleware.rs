//! Observation middleware
//!
//! Layered inside admission: requests rejected by the gate never get here.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

use crate::metrics::HttpTelemetry;

/// Telemetry endpoint, never observed
pub const TELEMETRY_PATH: &str = "/metrics";

/// Use with `axum::middleware::from_fn_with_state`
pub async fn observe(
    State(telemetry): State<Arc<HttpTelemetry>>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == TELEMETRY_PATH {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().to_string();
    // Unmatched requests (fallback 404s) carry no route pattern.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = {
        let _in_flight = telemetry.track_in_flight();
        next.run(request).await
    };

    telemetry.record_request(
        &method,
        &route,
        response.status().as_u16(),
        started.elapsed(),
    );
    response
}
