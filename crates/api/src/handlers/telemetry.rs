//! Handlers for the telemetry query endpoints.
//!
//! Responses are bare JSON (no envelope) to match what the live-view page
//! already parses.

use axum::extract::State;
use axum::Json;
use gaswatch_core::reading::Reading;
use gaswatch_core::telemetry::TelemetrySnapshot;

use crate::hub::ClearResult;
use crate::state::AppState;

/// GET /api/current
///
/// Latest reading with the history alongside, the same object carried by
/// `init` and `data` live messages.
pub async fn get_current(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    Json(state.hub.snapshot().await)
}

/// GET /api/history
pub async fn get_history(State(state): State<AppState>) -> Json<Vec<Reading>> {
    Json(state.hub.history().await)
}

/// POST /api/clear
pub async fn clear_history(State(state): State<AppState>) -> Json<ClearResult> {
    Json(state.hub.clear().await)
}
