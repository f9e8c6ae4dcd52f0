use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use gaswatch_broker::BrokerConfig;
use gaswatch_core::telemetry::DEFAULT_MAX_HISTORY;
use gaswatch_core::topics::TopicMap;

/// Env file read before `.env` by existing dashboard deployments.
pub const LEGACY_ENV_FILE: &str = "dados.env";

/// Load `dados.env` and then `.env` into the process environment.
///
/// Variables already present in the environment are never overridden, and
/// missing files are ignored.
pub fn load_env_files() {
    dotenvy::from_filename(LEGACY_ENV_FILE).ok();
    dotenvy::dotenv().ok();
}

/// Allowed CORS origins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin (`*`), without credentials.
    Any,
    /// An explicit allow-list.
    List(Vec<HeaderValue>),
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local broker and dashboard.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port for HTTP and WebSocket (default: `3000`).
    pub port: u16,
    pub cors_origins: CorsOrigins,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory served for any path not handled by the API (default: `public`).
    pub static_dir: PathBuf,
    /// Telemetry history capacity (default: `200`).
    pub max_history: usize,
    pub mqtt: MqttConfig,
}

/// Sensor broker settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    /// Broker host (default: `localhost`).
    pub host: String,
    /// Broker port (default: `1883`).
    pub port: u16,
    pub topics: TopicMap,
    /// Default: 4000 ms.
    pub connect_timeout: Duration,
    /// Default: 5000 ms.
    pub reconnect_period: Duration,
}

impl MqttConfig {
    /// Broker transport settings with a freshly generated client id.
    pub fn broker_config(&self) -> BrokerConfig {
        let mut config =
            BrokerConfig::new(self.host.clone(), self.port).with_topics(self.topics.topics());
        config.connect_timeout = self.connect_timeout;
        config.reconnect_period = self.reconnect_period;
        config
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `HOST`                     | `0.0.0.0`                |
    /// | `PORT`                     | `3000`                   |
    /// | `CORS_ORIGINS`             | `*`                      |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                     |
    /// | `STATIC_DIR`               | `public`                 |
    /// | `MAX_HISTORY`              | `200`                    |
    /// | `MQTT_BROKER`              | `localhost`              |
    /// | `MQTT_PORT`                | `1883`                   |
    /// | `MQTT_TOPIC_GAS`           | unset                    |
    /// | `MQTT_TOPIC_PPM`           | unset                    |
    /// | `MQTT_TOPIC_STATUS`        | unset                    |
    /// | `MQTT_CONNECT_TIMEOUT_MS`  | `4000`                   |
    /// | `MQTT_RECONNECT_PERIOD_MS` | `5000`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of
    /// an environment variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&var, "PORT", 3000u16, "a valid port number")?;

        let cors_origins = parse_cors_origins(var("CORS_ORIGINS").as_deref().unwrap_or("*"))?;

        let request_timeout_secs =
            parse_var(&var, "REQUEST_TIMEOUT_SECS", 30u64, "a whole number of seconds")?;

        let static_dir = PathBuf::from(var("STATIC_DIR").unwrap_or_else(|| "public".into()));

        let max_history = parse_var(
            &var,
            "MAX_HISTORY",
            DEFAULT_MAX_HISTORY,
            "a positive integer",
        )?;
        if max_history == 0 {
            return Err(ConfigError::Invalid {
                var: "MAX_HISTORY",
                value: "0".into(),
                expected: "a positive integer",
            });
        }

        let topics = TopicMap::from_options(
            var("MQTT_TOPIC_GAS"),
            var("MQTT_TOPIC_PPM"),
            var("MQTT_TOPIC_STATUS"),
        );

        let mqtt = MqttConfig {
            host: var("MQTT_BROKER").unwrap_or_else(|| "localhost".into()),
            port: parse_var(&var, "MQTT_PORT", 1883u16, "a valid port number")?,
            topics,
            connect_timeout: Duration::from_millis(parse_var(
                &var,
                "MQTT_CONNECT_TIMEOUT_MS",
                4000u64,
                "a whole number of milliseconds",
            )?),
            reconnect_period: Duration::from_millis(parse_var(
                &var,
                "MQTT_RECONNECT_PERIOD_MS",
                5000u64,
                "a whole number of milliseconds",
            )?),
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            static_dir,
            max_history,
            mqtt,
        })
    }
}

fn parse_var<T, V>(
    var: &V,
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            var: key,
            value: raw,
            expected,
        }),
    }
}

fn parse_cors_origins(raw: &str) -> Result<CorsOrigins, ConfigError> {
    let entries: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if entries.is_empty() || entries.contains(&"*") {
        return Ok(CorsOrigins::Any);
    }

    entries
        .into_iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                value: origin.to_string(),
                expected: "a comma-separated list of origins",
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(CorsOrigins::List)
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use gaswatch_core::reading::SensorField;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = load(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, CorsOrigins::Any);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.max_history, 200);
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert!(config.mqtt.topics.is_empty());
        assert_eq!(config.mqtt.connect_timeout, Duration::from_secs(4));
        assert_eq!(config.mqtt.reconnect_period, Duration::from_secs(5));
    }

    #[test]
    fn reads_broker_and_topic_settings() {
        let config = load(&[
            ("MQTT_BROKER", "10.0.0.5"),
            ("MQTT_PORT", "1884"),
            ("MQTT_TOPIC_GAS", "sensor/gas"),
            ("MQTT_TOPIC_STATUS", "sensor/status"),
            ("MQTT_TOPIC_PPM", ""),
        ])
        .unwrap();

        assert_eq!(config.mqtt.host, "10.0.0.5");
        assert_eq!(config.mqtt.port, 1884);
        assert_eq!(
            config.mqtt.topics.field_for("sensor/gas"),
            Some(SensorField::Gas)
        );
        assert_eq!(config.mqtt.topics.topic_for(SensorField::Ppm), None);

        let broker = config.mqtt.broker_config();
        assert_eq!(broker.url(), "mqtt://10.0.0.5:1884");
        assert_eq!(broker.topics, vec!["sensor/gas", "sensor/status"]);
        assert!(broker.client_id.starts_with("dashboard_"));
    }

    #[test]
    fn malformed_port_is_rejected() {
        assert_matches!(
            load(&[("PORT", "http")]),
            Err(ConfigError::Invalid { var: "PORT", value, .. }) if value == "http"
        );
    }

    #[test]
    fn zero_history_is_rejected() {
        assert_matches!(
            load(&[("MAX_HISTORY", "0")]),
            Err(ConfigError::Invalid { var: "MAX_HISTORY", .. })
        );
    }

    #[test]
    fn cors_list_is_parsed() {
        let config = load(&[(
            "CORS_ORIGINS",
            "http://localhost:5173, http://dash.local",
        )])
        .unwrap();
        assert_eq!(
            config.cors_origins,
            CorsOrigins::List(vec![
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://dash.local"),
            ])
        );
    }

    #[test]
    fn wildcard_anywhere_allows_any_origin() {
        let config = load(&[("CORS_ORIGINS", "http://a.local,*")]).unwrap();
        assert_eq!(config.cors_origins, CorsOrigins::Any);
    }
}
