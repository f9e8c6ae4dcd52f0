use std::sync::Arc;

use crate::config::ServerConfig;
use crate::hub::TelemetryHub;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (static directory, timeouts).
    pub config: Arc<ServerConfig>,
    /// Telemetry state and live-view sinks.
    pub hub: Arc<TelemetryHub>,
}
