use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use gaswatch_core::types::Timestamp;
use tokio::sync::mpsc;

/// Channel sender half for pushing messages to a WebSocket connection.
pub type SinkSender = mpsc::UnboundedSender<Message>;

/// A single connected live-view client.
pub struct Sink {
    /// Channel sender for outbound messages to this connection.
    pub sender: SinkSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
}

impl Sink {
    /// A sink is open while its writer task still holds the receiver.
    pub fn is_open(&self) -> bool {
        !self.sender.is_closed()
    }
}

/// The set of connected live-view sinks, keyed by connection id.
///
/// Not synchronized on its own: the registry lives inside
/// [`TelemetryHub`](crate::hub::TelemetryHub) and is only touched while the
/// hub lock is held, so broadcasts are ordered with state mutations.
#[derive(Default)]
pub struct SinkRegistry {
    sinks: HashMap<String, Sink>,
}

impl SinkRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink. Re-using an id replaces the
    /// previous connection.
    pub fn add(&mut self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Sink {
            sender: tx,
            connected_at: chrono::Utc::now(),
        };
        self.sinks.insert(conn_id, sink);
        rx
    }

    /// Remove a connection by its id, returning it if it was registered.
    pub fn remove(&mut self, conn_id: &str) -> Option<Sink> {
        self.sinks.remove(conn_id)
    }

    /// Send a message to one connection. Returns `false` if it is unknown
    /// or closed.
    pub fn send_to(&self, conn_id: &str, message: Message) -> bool {
        self.sinks
            .get(conn_id)
            .is_some_and(|sink| sink.sender.send(message).is_ok())
    }

    /// Send a message to every open connection.
    ///
    /// Closed connections are skipped and dropped from the registry.
    /// Returns the number of connections the message was delivered to.
    pub fn broadcast(&mut self, message: Message) -> usize {
        let mut delivered = 0;
        self.sinks.retain(|conn_id, sink| {
            if sink.is_open() && sink.sender.send(message.clone()).is_ok() {
                delivered += 1;
                true
            } else {
                tracing::debug!(conn_id = %conn_id, "Dropping closed WebSocket sink");
                false
            }
        });
        delivered
    }

    /// Send a Ping frame to every open connection.
    ///
    /// Connections whose writer task has gone away are dropped here too, so
    /// a quiet broker does not leave stale sinks registered. Returns how
    /// many connections were pinged.
    pub fn ping_all(&mut self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.broadcast(Message::Ping(Bytes::new()))
    }

    /// Send a Close frame to every connection, then clear the registry.
    ///
    /// Returns how many connections were closed.
    pub fn shutdown_all(&mut self) -> usize {
        let count = self.sinks.len();
        for sink in self.sinks.values() {
            let _ = sink.sender.send(Message::Close(None));
        }
        self.sinks.clear();
        count
    }

    /// Return the current number of registered connections.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}
