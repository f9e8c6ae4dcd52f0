//! Read and clear accessors backing the HTTP endpoints.
//!
//! All operations are total: they always return the current (possibly
//! default) state and never fail.

use gaswatch_core::messages::LiveMessage;
use gaswatch_core::reading::Reading;
use gaswatch_core::telemetry::TelemetrySnapshot;
use serde::Serialize;

use super::TelemetryHub;

/// Body returned by `POST /api/clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearResult {
    pub success: bool,
}

impl TelemetryHub {
    /// The latest reading.
    pub async fn current(&self) -> Reading {
        self.inner.lock().await.telemetry.latest().clone()
    }

    /// Stored history, oldest first.
    pub async fn history(&self) -> Vec<Reading> {
        self.inner
            .lock()
            .await
            .telemetry
            .history()
            .cloned()
            .collect()
    }

    /// Latest reading and history taken under one lock.
    pub async fn snapshot(&self) -> TelemetrySnapshot {
        self.inner.lock().await.telemetry.snapshot()
    }

    /// Empty the history, keep the latest reading, and tell every sink.
    pub async fn clear(&self) -> ClearResult {
        let mut inner = self.inner.lock().await;
        inner.telemetry.clear_history();
        let delivered = inner.publish(&LiveMessage::Cleared);
        tracing::info!(sinks = delivered, "Telemetry history cleared");
        ClearResult { success: true }
    }
}
