//! Route table and middleware stack

use std::sync::Arc;
use std::time::Duration;

use admission::{admit, Admission};
use axum::{http::StatusCode, middleware, routing::get, Router};
use observability::{observe, TELEMETRY_PATH};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers;
use crate::state::AppState;

/// Build the application router
pub fn build_router(state: AppState, admission: Admission, request_timeout: Duration) -> Router {
    with_middleware(api_routes(), state, admission, request_timeout)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route(
            "/api/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/api/health", get(handlers::health))
        .route(TELEMETRY_PATH, get(handlers::metrics))
        .fallback(handlers::not_found)
}

/// Layers from the outside in: trace, admission, observation, timeout.
/// A request refused by admission is therefore never observed, and a
/// timed-out request is observed as a 408.
fn with_middleware(
    routes: Router<AppState>,
    state: AppState,
    admission: Admission,
    request_timeout: Duration,
) -> Router {
    let telemetry = Arc::clone(&state.telemetry);

    routes
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn_with_state(telemetry, observe))
        .layer(middleware::from_fn_with_state(admission, admit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
