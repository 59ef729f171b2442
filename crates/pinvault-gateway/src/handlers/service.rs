//! Service-level handlers (health, PIN check)

use crate::auth::PinBody;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// PIN check response
#[derive(Debug, Serialize)]
pub struct PinCheckResponse {
    pub valid: bool,
}

/// GET / - Health check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Locked folder API running",
    })
}

/// POST /auth/check - Report whether a PIN is correct
///
/// Never rejects; a missing or wrong PIN is simply `{"valid": false}`.
pub async fn auth_check(
    State(state): State<Arc<AppState>>,
    body: PinBody,
) -> Json<PinCheckResponse> {
    let valid = state.pin_guard.matches(body.pin());
    tracing::debug!(valid, "PIN check");
    Json(PinCheckResponse { valid })
}
