//! Telemetry hub: the telemetry state and the live-view sink registry behind
//! one lock.
//!
//! Every mutation, broadcast, sink registration and read goes through the
//! same [`tokio::sync::Mutex`], so events are applied strictly one at a time
//! and each sink receives messages in the order they were published. Sink
//! delivery is a non-blocking push into the sink's channel; socket writes
//! happen in per-connection tasks outside the lock.
//!
//! Query accessors live in [`query`].

pub mod query;

use axum::extract::ws::Message;
use gaswatch_core::error::CoreError;
use gaswatch_core::messages::{BrokerStatus, LiveMessage};
use gaswatch_core::reading::{Reading, SensorField};
use gaswatch_core::telemetry::TelemetryState;
use tokio::sync::{mpsc, Mutex};

use crate::ws::SinkRegistry;

pub use query::ClearResult;

struct HubInner {
    telemetry: TelemetryState,
    sinks: SinkRegistry,
}

impl HubInner {
    /// Serialize and broadcast `message` to every open sink.
    fn publish(&mut self, message: &LiveMessage) -> usize {
        match encode(message) {
            Some(frame) => self.sinks.broadcast(frame),
            None => 0,
        }
    }
}

/// Shared telemetry state plus its live-view fan-out.
///
/// Designed to be wrapped in `Arc` and shared between the ingestion task,
/// HTTP handlers and WebSocket connections.
pub struct TelemetryHub {
    inner: Mutex<HubInner>,
}

impl TelemetryHub {
    /// Create a hub whose history retains at most `max_history` readings.
    pub fn new(max_history: usize) -> Result<Self, CoreError> {
        Ok(Self::from_state(TelemetryState::with_capacity(max_history)?))
    }

    /// Wrap an existing telemetry state with an empty sink registry.
    pub fn from_state(telemetry: TelemetryState) -> Self {
        Self {
            inner: Mutex::new(HubInner {
                telemetry,
                sinks: SinkRegistry::new(),
            }),
        }
    }

    // ---- ingestion ----

    /// Apply one raw sensor value and broadcast the resulting snapshot as a
    /// `data` message.
    ///
    /// Returns the updated latest reading.
    pub async fn apply_reading(&self, field: SensorField, raw: &str) -> Reading {
        let mut inner = self.inner.lock().await;
        inner.telemetry.update_field(field, raw);
        let message = LiveMessage::Data {
            data: inner.telemetry.snapshot(),
        };
        inner.publish(&message);
        inner.telemetry.latest().clone()
    }

    /// Broadcast a broker connection status change. State is not touched.
    pub async fn broker_status(&self, status: BrokerStatus) -> usize {
        self.publish(&LiveMessage::Mqtt { status }).await
    }

    // ---- fan-out ----

    /// Broadcast `message` to every open sink.
    ///
    /// Returns how many sinks it was delivered to.
    pub async fn publish(&self, message: &LiveMessage) -> usize {
        self.inner.lock().await.publish(message)
    }

    /// Register a new live-view sink and queue its `init` snapshot.
    ///
    /// Registration and the `init` send happen under the hub lock, so the
    /// sink sees no message published before it connected and every message
    /// published after its `init`.
    pub async fn connect_sink(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let mut inner = self.inner.lock().await;
        let init = LiveMessage::Init {
            data: inner.telemetry.snapshot(),
        };
        let rx = inner.sinks.add(conn_id.clone());
        if let Some(frame) = encode(&init) {
            inner.sinks.send_to(&conn_id, frame);
        }
        rx
    }

    /// Unregister a sink and return how long it was connected.
    ///
    /// Unknown ids (already pruned or never registered) yield `None`.
    pub async fn disconnect_sink(&self, conn_id: &str) -> Option<chrono::Duration> {
        let sink = self.inner.lock().await.sinks.remove(conn_id)?;
        Some(chrono::Utc::now() - sink.connected_at)
    }

    /// Return the current number of registered sinks.
    pub async fn sink_count(&self) -> usize {
        self.inner.lock().await.sinks.len()
    }

    /// Ping every open sink, pruning closed ones. Returns how many were
    /// pinged.
    pub async fn ping_all(&self) -> usize {
        self.inner.lock().await.sinks.ping_all()
    }

    /// Send Close to every sink and empty the registry.
    pub async fn shutdown_all(&self) {
        let count = self.inner.lock().await.sinks.shutdown_all();
        tracing::info!(count, "Closed all WebSocket connections");
    }
}

/// Serialize a live message into a WebSocket text frame.
fn encode(message: &LiveMessage) -> Option<Message> {
    match message.to_json() {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!(
                error = %e,
                message_type = message.message_type(),
                "Failed to serialize live message"
            );
            None
        }
    }
}
