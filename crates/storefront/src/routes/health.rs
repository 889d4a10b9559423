//! Liveness and readiness probes.

use axum::{extract::State, http::StatusCode};
use tracing::instrument;

use crate::state::AppState;

/// Liveness: the process is serving requests.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the Storefront API answers.
#[instrument(skip(state))]
pub async fn readiness(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    state.storefront().ping().await.map(|()| "ok").map_err(|e| {
        tracing::warn!("Readiness check failed: {e}");
        StatusCode::SERVICE_UNAVAILABLE
    })
}
