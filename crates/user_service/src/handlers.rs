//! User API handlers
//!
//! Every outcome is answered immediately; audit entries, notifications and
//! error records are submitted to the dispatchers and never awaited.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use contracts::{User, UserInput};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::StoreError;

const INVALID_ID: &str = "Invalid user ID";
const INVALID_BODY: &str = "Invalid request body";
const USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// `GET /api/users`
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state.store.list();
    state.effects.audit("LIST_USERS", None, "");
    Json(users)
}

/// `GET /api/users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&state, "get_user", &raw_id)?;
    match state.store.get(id) {
        Ok(user) => {
            state.effects.audit("GET_USER", Some(id), "");
            Ok(Json(user))
        }
        Err(e) => {
            state
                .effects
                .audit("GET_USER_NOT_FOUND", Some(id), e.to_string());
            Err(ApiError::not_found(USER_NOT_FOUND))
        }
    }
}

/// `POST /api/users`
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<UserInput>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let input = parse_body(&state, "create_user", body)?;
    match state.store.create(input) {
        Ok(user) => {
            state.publish_user_count();
            state.effects.audit("CREATE", Some(user.id), "");
            state
                .effects
                .notify(user.id, "WELCOME", "User account created successfully");
            Ok((StatusCode::CREATED, Json(user)))
        }
        Err(e) => Err(store_failure(&state, "create_user", e)),
    }
}

/// `PUT /api/users/:id`
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<UserInput>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let id = parse_id(&state, "update_user", &raw_id)?;
    let input = parse_body(&state, "update_user", body)?;
    match state.store.update(id, input) {
        Ok(user) => {
            state.effects.audit("UPDATE", Some(id), "");
            state
                .effects
                .notify(id, "PROFILE_UPDATED", "Your profile has been updated");
            Ok(Json(user))
        }
        Err(e @ StoreError::NotFound(_)) => {
            state
                .effects
                .audit("UPDATE_USER_NOT_FOUND", Some(id), e.to_string());
            Err(ApiError::not_found(USER_NOT_FOUND))
        }
        Err(e) => Err(store_failure(&state, "update_user", e)),
    }
}

/// `DELETE /api/users/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageBody>, ApiError> {
    let id = parse_id(&state, "delete_user", &raw_id)?;
    match state.store.delete(id) {
        Ok(()) => {
            state.publish_user_count();
            state.effects.audit("DELETE", Some(id), "");
            state
                .effects
                .notify(id, "ACCOUNT_DELETED", "User account has been deleted");
            Ok(Json(MessageBody {
                message: "User deleted successfully".to_string(),
            }))
        }
        Err(e) => {
            state
                .effects
                .audit("DELETE_USER_NOT_FOUND", Some(id), e.to_string());
            Err(ApiError::not_found(USER_NOT_FOUND))
        }
    }
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let dispatchers: serde_json::Map<String, Value> = state
        .effects
        .snapshots()
        .into_iter()
        .map(|(name, snapshot)| (name.to_string(), json!(snapshot)))
        .collect();
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "dispatchers": dispatchers,
    }))
}

/// `GET /metrics`
pub async fn metrics(State(state): State<AppState>) -> Response {
    for (name, snapshot) in state.effects.snapshots() {
        state.telemetry.record_dispatch(name, &snapshot);
    }
    state.publish_user_count();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.telemetry.render(),
    )
        .into_response()
}

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

fn parse_id(state: &AppState, operation: &str, raw: &str) -> Result<u64, ApiError> {
    raw.parse::<u64>().map_err(|e| {
        state
            .effects
            .report_error(operation, Some(e.to_string()), "invalid user ID format");
        ApiError::bad_request(INVALID_ID)
    })
}

fn parse_body(
    state: &AppState,
    operation: &str,
    body: Result<Json<UserInput>, JsonRejection>,
) -> Result<UserInput, ApiError> {
    match body {
        Ok(Json(input)) => Ok(input),
        Err(rejection) => {
            debug!(operation, error = %rejection.body_text(), "Request body rejected");
            state.effects.report_error(
                operation,
                Some(rejection.body_text()),
                "failed to decode request body",
            );
            Err(ApiError::bad_request(INVALID_BODY))
        }
    }
}

fn store_failure(state: &AppState, operation: &str, error: StoreError) -> ApiError {
    match error {
        StoreError::NotFound(_) => ApiError::not_found(USER_NOT_FOUND),
        StoreError::Validation(e) => {
            let message = e.to_string();
            state
                .effects
                .report_error(operation, Some(message.clone()), "validation failed");
            ApiError::bad_request(message)
        }
    }
}
