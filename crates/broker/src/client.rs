//! MQTT client construction for the sensor broker.
//!
//! [`BrokerClient`] holds the connection settings. Call
//! [`BrokerClient::open`] to obtain the `rumqttc` request handle and the
//! event loop that drives the network connection.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS, SubscribeFilter};

use crate::config::BrokerConfig;

/// Capacity of the client -> event loop request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// Configuration handle for the sensor broker.
pub struct BrokerClient {
    config: BrokerConfig,
}

impl BrokerClient {
    pub fn new(config: BrokerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Translate [`BrokerConfig`] into `rumqttc` options.
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_clean_session(self.config.clean_session);
        options.set_keep_alive(self.config.keep_alive);
        options
    }

    /// Create the request handle and event loop.
    ///
    /// No network I/O happens until the event loop is polled.
    pub fn open(&self) -> (AsyncClient, EventLoop) {
        AsyncClient::new(self.mqtt_options(), REQUEST_CHANNEL_CAPACITY)
    }
}

/// Queue a single SUBSCRIBE for every topic at QoS 0.
///
/// Does nothing when `topics` is empty. The request is only enqueued here;
/// the broker's answer arrives later as a SUBACK on the event loop.
pub fn subscribe_all(client: &AsyncClient, topics: &[String]) -> Result<(), BrokerError> {
    if topics.is_empty() {
        return Ok(());
    }

    let filters = topics
        .iter()
        .map(|topic| SubscribeFilter::new(topic.clone(), QoS::AtMostOnce));

    client
        .try_subscribe_many(filters)
        .map_err(|e| BrokerError::Request(format!("Failed to queue subscription: {e}")))
}

/// Errors that can occur while talking to the broker.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// A connection attempt did not complete in time.
    #[error("Connection attempt timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// The network connection failed or was dropped.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A request could not be handed to the event loop.
    #[error("Request error: {0}")]
    Request(String),
}
