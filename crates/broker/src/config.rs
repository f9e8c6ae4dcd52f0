use std::time::Duration;

/// Prefix for generated MQTT client identifiers.
pub const CLIENT_ID_PREFIX: &str = "dashboard_";

/// Default broker host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default broker port (plain MQTT).
pub const DEFAULT_PORT: u16 = 1883;

/// Default upper bound on a single connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(4000);

/// Default fixed delay between reconnection attempts.
pub const DEFAULT_RECONNECT_PERIOD: Duration = Duration::from_millis(5000);

/// Default MQTT keep-alive interval.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Connection settings for the sensor broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Broker hostname or IP address.
    pub host: String,
    /// Broker TCP port.
    pub port: u16,
    /// Client identifier presented in CONNECT.
    pub client_id: String,
    /// Start every session without stored subscriptions or queued messages.
    pub clean_session: bool,
    /// Maximum time a single connection attempt may take.
    pub connect_timeout: Duration,
    /// Fixed delay after a failed attempt or a dropped connection.
    pub reconnect_period: Duration,
    pub keep_alive: Duration,
    /// Topics subscribed to after each successful connection. May be empty.
    pub topics: Vec<String>,
}

impl BrokerConfig {
    /// Settings for `host:port` with a freshly generated client id and
    /// default timings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: generate_client_id(),
            clean_session: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_period: DEFAULT_RECONNECT_PERIOD,
            keep_alive: DEFAULT_KEEP_ALIVE,
            topics: Vec::new(),
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Broker address in URL form, for logging.
    pub fn url(&self) -> String {
        format!("mqtt://{}:{}", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Generate a client id of the form `dashboard_xxxxxx` (six hex chars).
pub fn generate_client_id() -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("{CLIENT_ID_PREFIX}{}", &random[..6])
}
