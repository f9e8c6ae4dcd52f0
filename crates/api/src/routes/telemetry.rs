use axum::routing::{get, post};
use axum::Router;

use crate::handlers::telemetry;
use crate::state::AppState;

/// Telemetry routes mounted at `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/current", get(telemetry::get_current))
        .route("/history", get(telemetry::get_history))
        .route("/clear", post(telemetry::clear_history))
}
