use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::hub::TelemetryHub;
use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with the
/// [`TelemetryHub`] and managed by two tasks (sender + receiver).
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

/// `GET /`: live-view WebSocket when the request asks for an upgrade,
/// otherwise the static index page.
pub async fn root_handler(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    request: Request,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_socket(socket, state.hub))
            .into_response(),
        Err(_) => {
            let result: Result<_, Infallible> =
                ServeDir::new(&state.config.static_dir).oneshot(request).await;
            match result {
                Ok(response) => response.into_response(),
                Err(never) => match never {},
            }
        }
    }
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with the hub, which queues `init`.
///   2. Spawns a sender task that forwards messages from the hub channel.
///   3. Drains inbound frames until the client closes.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, hub: Arc<TelemetryHub>) {
    let conn_id = uuid::Uuid::new_v4().to_string();

    let mut rx = hub.connect_sink(conn_id.clone()).await;
    let total = hub.sink_count().await;
    tracing::info!(conn_id = %conn_id, total, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // The live view is push-only; inbound data frames are ignored.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    let connected = hub.disconnect_sink(&conn_id).await;
    send_task.abort();
    match connected {
        Some(duration) => tracing::info!(
            conn_id = %conn_id,
            connected_secs = duration.num_seconds(),
            "WebSocket disconnected"
        ),
        None => tracing::info!(conn_id = %conn_id, "WebSocket disconnected after pruning"),
    }
}
