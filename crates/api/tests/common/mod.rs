#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ws::Message;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use gaswatch_api::config::{CorsOrigins, MqttConfig, ServerConfig};
use gaswatch_api::hub::TelemetryHub;
use gaswatch_api::router::build_app_router;
use gaswatch_api::state::AppState;
use gaswatch_core::topics::TopicMap;
use http_body_util::BodyExt;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const GAS_TOPIC: &str = "sensor/gas";
pub const PPM_TOPIC: &str = "sensor/ppm";
pub const STATUS_TOPIC: &str = "sensor/status";

/// Topic map with all three sensor fields bound.
pub fn test_topics() -> TopicMap {
    TopicMap::from_options(
        Some(GAS_TOPIC.to_string()),
        Some(PPM_TOPIC.to_string()),
        Some(STATUS_TOPIC.to_string()),
    )
}

/// Build a test `ServerConfig` with safe defaults serving `static_dir`.
pub fn test_config(static_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: CorsOrigins::Any,
        request_timeout_secs: 30,
        static_dir,
        max_history: 200,
        mqtt: MqttConfig {
            host: "localhost".to_string(),
            port: 1883,
            topics: test_topics(),
            connect_timeout: Duration::from_millis(4000),
            reconnect_period: Duration::from_millis(5000),
        },
    }
}

/// Build the full application router around `hub`.
///
/// Uses the same builder as `main.rs` so tests exercise the production
/// middleware stack.
pub fn build_test_app(hub: Arc<TelemetryHub>, config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        hub,
    };
    build_app_router(state, &config)
}

/// A static directory containing an `index.html` page.
pub fn static_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<!doctype html><title>Gas monitor</title>",
    )
    .unwrap();
    dir
}

/// A fresh hub with the given history capacity.
pub fn test_hub(max_history: usize) -> Arc<TelemetryHub> {
    Arc::new(TelemetryHub::new(max_history).unwrap())
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri).await
}

pub async fn post(app: Router, uri: &str) -> Response {
    send(app, Method::POST, uri).await
}

async fn send(app: Router, method: Method, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Drain every frame already queued on a sink and parse text frames as JSON.
pub fn drain_json(rx: &mut mpsc::UnboundedReceiver<Message>) -> Vec<serde_json::Value> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let Message::Text(text) = msg {
            out.push(serde_json::from_str(text.as_str()).unwrap());
        }
    }
    out
}
