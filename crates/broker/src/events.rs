//! Events emitted by the broker connection task.
//!
//! The connection loop translates raw MQTT traffic into these values and
//! pushes them, in order, onto a single channel.

/// A broker-side occurrence relevant to ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// A session was established (CONNACK received) and subscriptions were requested.
    Connected,

    /// An application message arrived on `topic`.
    Message { topic: String, payload: Vec<u8> },

    /// A transport or protocol error. Always followed by [`BrokerEvent::Disconnected`].
    Error(String),

    /// The session closed or a connection attempt failed.
    Disconnected,
}
