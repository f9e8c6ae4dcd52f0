//! Broker-to-telemetry ingestion.
//!
//! [`IngestionAdapter`] consumes [`BrokerEvent`]s from the broker connection
//! task, applies sensor messages to the [`TelemetryHub`] and relays broker
//! status changes to live-view clients.

use std::sync::Arc;

use gaswatch_broker::BrokerEvent;
use gaswatch_core::messages::BrokerStatus;
use gaswatch_core::reading::decode_payload;
use gaswatch_core::topics::TopicMap;
use tokio::sync::mpsc;

use crate::hub::TelemetryHub;

/// Capacity of the broker -> ingestion event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Applies broker events to the telemetry hub.
pub struct IngestionAdapter {
    hub: Arc<TelemetryHub>,
    topics: TopicMap,
}

impl IngestionAdapter {
    pub fn new(hub: Arc<TelemetryHub>, topics: TopicMap) -> Self {
        Self { hub, topics }
    }

    /// Run the ingestion loop.
    ///
    /// Events are handled strictly in arrival order. The loop exits when the
    /// channel is closed (i.e. the broker connection task has stopped).
    pub async fn run(self, mut events: mpsc::Receiver<BrokerEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        tracing::info!("Broker event channel closed, ingestion stopped");
    }

    /// Dispatch a single broker event.
    pub async fn handle(&self, event: BrokerEvent) {
        match event {
            BrokerEvent::Connected => self.on_connect().await,
            BrokerEvent::Message { topic, payload } => {
                self.on_message(&topic, &payload).await;
            }
            BrokerEvent::Error(error) => {
                tracing::warn!(error = %error, "Broker error");
            }
            BrokerEvent::Disconnected => self.on_disconnect().await,
        }
    }

    /// Apply a sensor message and broadcast the new snapshot.
    ///
    /// Returns `false` if `topic` is not mapped to any field.
    pub async fn on_message(&self, topic: &str, payload: &[u8]) -> bool {
        let Some(field) = self.topics.field_for(topic) else {
            tracing::trace!(topic = %topic, "Ignoring message on unmapped topic");
            return false;
        };

        let raw = decode_payload(payload);
        let latest = self.hub.apply_reading(field, &raw).await;
        tracing::debug!(
            field = %field,
            gas = latest.gas,
            ppm = latest.ppm,
            status = %latest.status,
            "Reading applied",
        );
        true
    }

    pub async fn on_connect(&self) {
        let sinks = self.hub.broker_status(BrokerStatus::Connected).await;
        tracing::info!(sinks, "Broker connected, notified live view");
    }

    pub async fn on_disconnect(&self) {
        let sinks = self.hub.broker_status(BrokerStatus::Disconnected).await;
        tracing::info!(sinks, "Broker disconnected, notified live view");
    }
}
