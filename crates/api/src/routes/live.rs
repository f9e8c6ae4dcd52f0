use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Live-view routes mounted at the root.
///
/// ```text
/// GET /      WebSocket upgrade, or the static index page
/// GET /ws    WebSocket upgrade
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ws::root_handler))
        .route("/ws", get(ws::ws_handler))
}
