pub mod health;
pub mod live;
pub mod telemetry;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// GET  /current                 latest reading + history
/// GET  /history                 history, oldest first
/// POST /clear                   clear history, notify live view
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(telemetry::router())
}
