//! Health check endpoint.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    challenge: bool,
    delivery: bool,
    request_delay_ms: u64,
}

/// Basic health check (is the server running?), without the protocol delay
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        challenge: state.flow.challenge_enabled(),
        delivery: state.flow.delivery_enabled(),
        request_delay_ms: state.config.request_delay_ms,
    })
}
