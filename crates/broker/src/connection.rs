//! Broker connection loop: connect -> subscribe -> receive -> reconnect.
//!
//! The loop owns the `rumqttc` event loop and translates its traffic into
//! [`BrokerEvent`]s sent in order on one channel. Every failure, whether a
//! refused connection, a timeout or a dropped session, is reported as
//! `Error` + `Disconnected` and followed by a fixed reconnect delay.

use std::time::Duration;

use rumqttc::{Event, EventLoop, Packet, SubscribeReasonCode};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::client::{subscribe_all, BrokerClient, BrokerError};
use crate::config::BrokerConfig;
use crate::events::BrokerEvent;
use crate::reconnect::wait_before_retry;

/// Spawn the connection loop as a background task.
pub fn spawn(
    config: BrokerConfig,
    events: mpsc::Sender<BrokerEvent>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        run(config, events, cancel).await;
        tracing::info!("Broker connection task exited");
    })
}

/// Run the connection loop until `cancel` fires or the event receiver is
/// dropped.
pub async fn run(
    config: BrokerConfig,
    events: mpsc::Sender<BrokerEvent>,
    cancel: CancellationToken,
) {
    let client = BrokerClient::new(config);
    let (handle, mut eventloop) = client.open();
    let config = client.config();

    if config.topics.is_empty() {
        tracing::warn!("No broker topics configured, nothing will be subscribed");
    }

    tracing::info!(
        url = %config.url(),
        client_id = %config.client_id,
        "Connecting to broker",
    );

    let mut connected = false;

    loop {
        let polled = tokio::select! {
            _ = cancel.cancelled() => break,
            polled = poll_once(&mut eventloop, connected, config.connect_timeout) => polled,
        };

        let step = match polled {
            Ok(event) => classify(event),
            Err(e) => {
                tracing::warn!(url = %config.url(), error = %e, "Broker connection lost");
                connected = false;

                if !emit(&events, BrokerEvent::Error(e.to_string())).await
                    || !emit(&events, BrokerEvent::Disconnected).await
                {
                    break;
                }

                if !wait_before_retry(config.reconnect_period, &cancel).await {
                    break;
                }
                tracing::info!(url = %config.url(), "Reconnecting to broker");
                continue;
            }
        };

        match step {
            Step::Connected => {
                connected = true;
                tracing::info!(url = %config.url(), "Broker connected");

                if !config.topics.is_empty() {
                    match subscribe_all(&handle, &config.topics) {
                        Ok(()) => tracing::debug!(topics = ?config.topics, "Subscription requested"),
                        Err(e) => tracing::warn!(error = %e, "Failed to subscribe to topics"),
                    }
                }

                if !emit(&events, BrokerEvent::Connected).await {
                    break;
                }
            }
            Step::Subscribed { failed } => {
                if failed == 0 {
                    tracing::info!(topics = %config.topics.join(", "), "Subscribed to topics");
                } else {
                    tracing::warn!(
                        failed,
                        topics = %config.topics.join(", "),
                        "Broker rejected topic subscription",
                    );
                }
            }
            Step::Message { topic, payload } => {
                tracing::trace!(topic = %topic, bytes = payload.len(), "Broker message");
                if !emit(&events, BrokerEvent::Message { topic, payload }).await {
                    break;
                }
            }
            Step::Ignore => {}
        }
    }

    if connected {
        let _ = handle.try_disconnect();
    }
    tracing::info!(url = %config.url(), "Broker connection loop stopped");
}

/// Poll the event loop once, bounding the attempt by `connect_timeout`
/// while no session is established.
async fn poll_once(
    eventloop: &mut EventLoop,
    connected: bool,
    connect_timeout: Duration,
) -> Result<Event, BrokerError> {
    if connected {
        return eventloop
            .poll()
            .await
            .map_err(|e| BrokerError::Connection(e.to_string()));
    }

    match tokio::time::timeout(connect_timeout, eventloop.poll()).await {
        Ok(result) => result.map_err(|e| BrokerError::Connection(e.to_string())),
        Err(_) => Err(BrokerError::ConnectTimeout(connect_timeout)),
    }
}

/// Send `event`, returning `false` once the receiver is gone.
async fn emit(events: &mpsc::Sender<BrokerEvent>, event: BrokerEvent) -> bool {
    if events.send(event).await.is_err() {
        tracing::info!("Broker event receiver dropped");
        return false;
    }
    true
}

/// What the loop should do with one event-loop notification.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Connected,
    Subscribed { failed: usize },
    Message { topic: String, payload: Vec<u8> },
    Ignore,
}

fn classify(event: Event) -> Step {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Step::Connected,
        Event::Incoming(Packet::SubAck(ack)) => Step::Subscribed {
            failed: ack
                .return_codes
                .iter()
                .filter(|code| matches!(code, SubscribeReasonCode::Failure))
                .count(),
        },
        Event::Incoming(Packet::Publish(publish)) => Step::Message {
            topic: publish.topic,
            payload: publish.payload.to_vec(),
        },
        _ => Step::Ignore,
    }
}
