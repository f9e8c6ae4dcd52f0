//! Broker topic to sensor field mapping.
//!
//! Each [`SensorField`] may be fed by at most one topic. Fields without a
//! topic are simply never updated, and messages on unmapped topics are
//! ignored.

use std::collections::HashMap;

use crate::reading::SensorField;

/// Configured topic for each sensor field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicMap {
    by_field: HashMap<SensorField, String>,
}

impl TopicMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from optional per-field topics. Empty or whitespace-only
    /// topics count as absent.
    pub fn from_options(gas: Option<String>, ppm: Option<String>, status: Option<String>) -> Self {
        let mut map = Self::new();
        for (field, topic) in [
            (SensorField::Gas, gas),
            (SensorField::Ppm, ppm),
            (SensorField::Status, status),
        ] {
            if let Some(topic) = topic {
                map.set(field, topic);
            }
        }
        map
    }

    /// Map `field` to `topic`, replacing any previous topic for that field.
    /// An empty topic removes the mapping.
    pub fn set(&mut self, field: SensorField, topic: impl Into<String>) {
        let topic = topic.into().trim().to_string();
        if topic.is_empty() {
            self.by_field.remove(&field);
        } else {
            self.by_field.insert(field, topic);
        }
    }

    pub fn topic_for(&self, field: SensorField) -> Option<&str> {
        self.by_field.get(&field).map(String::as_str)
    }

    /// Resolve the field fed by `topic`.
    ///
    /// If several fields share a topic, the first in gas, ppm, status order
    /// wins.
    pub fn field_for(&self, topic: &str) -> Option<SensorField> {
        SensorField::ALL
            .into_iter()
            .find(|field| self.topic_for(*field) == Some(topic))
    }

    /// Distinct topics to subscribe to, in gas, ppm, status order.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = Vec::with_capacity(self.by_field.len());
        for field in SensorField::ALL {
            if let Some(topic) = self.topic_for(field) {
                if !topics.iter().any(|t| t == topic) {
                    topics.push(topic.to_string());
                }
            }
        }
        topics
    }

    pub fn is_empty(&self) -> bool {
        self.by_field.is_empty()
    }
}
