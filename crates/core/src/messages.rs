//! JSON envelopes pushed to live-view clients.
//!
//! Every message is an object tagged by its `"type"` field:
//!
//! ```text
//! {"type":"init",    "data": {gas, ppm, status, timestamp, history}}
//! {"type":"data",    "data": {gas, ppm, status, timestamp, history}}
//! {"type":"mqtt",    "status": "connected" | "disconnected"}
//! {"type":"cleared"}
//! ```

use serde::Serialize;

use crate::telemetry::TelemetrySnapshot;

/// Message type discriminator for the snapshot sent to a newly connected client.
pub const MSG_TYPE_INIT: &str = "init";

/// Message type discriminator for snapshot updates after a sensor event.
pub const MSG_TYPE_DATA: &str = "data";

/// Message type discriminator for broker connection status changes.
pub const MSG_TYPE_MQTT: &str = "mqtt";

/// Message type discriminator for history clear notifications.
pub const MSG_TYPE_CLEARED: &str = "cleared";

/// Connection state of the sensor broker as seen by live-view clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerStatus {
    Connected,
    Disconnected,
}

/// A message pushed to live-view clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LiveMessage {
    /// Full state, sent once to a client right after it connects.
    Init { data: TelemetrySnapshot },
    /// Full state after a sensor field changed.
    Data { data: TelemetrySnapshot },
    /// Broker connection status changed.
    Mqtt { status: BrokerStatus },
    /// History was cleared.
    Cleared,
}

impl LiveMessage {
    pub fn message_type(&self) -> &'static str {
        match self {
            LiveMessage::Init { .. } => MSG_TYPE_INIT,
            LiveMessage::Data { .. } => MSG_TYPE_DATA,
            LiveMessage::Mqtt { .. } => MSG_TYPE_MQTT,
            LiveMessage::Cleared => MSG_TYPE_CLEARED,
        }
    }

    /// Serialize to the JSON text sent over the wire.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reading::SensorField;
    use crate::telemetry::TelemetryState;

    fn to_value(msg: &LiveMessage) -> serde_json::Value {
        serde_json::from_str(&msg.to_json().unwrap()).unwrap()
    }

    #[test]
    fn cleared_has_only_type() {
        let json = to_value(&LiveMessage::Cleared);
        assert_eq!(json, serde_json::json!({"type": "cleared"}));
    }

    #[test]
    fn mqtt_status_shapes() {
        let connected = to_value(&LiveMessage::Mqtt {
            status: BrokerStatus::Connected,
        });
        assert_eq!(
            connected,
            serde_json::json!({"type": "mqtt", "status": "connected"})
        );

        let disconnected = to_value(&LiveMessage::Mqtt {
            status: BrokerStatus::Disconnected,
        });
        assert_eq!(disconnected["status"], "disconnected");
    }

    #[test]
    fn init_and_data_carry_flat_snapshot() {
        let mut state = TelemetryState::new();
        state.update_field(SensorField::Gas, "15");
        state.update_field(SensorField::Status, "NORMAL");

        for msg in [
            LiveMessage::Init {
                data: state.snapshot(),
            },
            LiveMessage::Data {
                data: state.snapshot(),
            },
        ] {
            let json = to_value(&msg);
            assert_eq!(json["type"], msg.message_type());
            let data = &json["data"];
            assert_eq!(data["gas"], 15);
            assert_eq!(data["ppm"], 0.0);
            assert_eq!(data["status"], "NORMAL");
            assert!(data["timestamp"].is_string());
            assert_eq!(data["history"].as_array().unwrap().len(), 2);
            assert_eq!(data.as_object().unwrap().len(), 5);
        }
    }

    #[test]
    fn message_type_matches_serialized_tag() {
        let msgs = [
            LiveMessage::Cleared,
            LiveMessage::Mqtt {
                status: BrokerStatus::Connected,
            },
            LiveMessage::Data {
                data: TelemetryState::new().snapshot(),
            },
        ];
        for msg in msgs {
            assert_eq!(to_value(&msg)["type"], msg.message_type());
        }
    }
}
