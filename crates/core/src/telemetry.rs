//! In-memory telemetry state: the latest reading plus a bounded history.
//!
//! Each inbound sensor event updates exactly one field of the latest reading,
//! refreshes its timestamp and appends a full copy of the latest reading to
//! the history ring. When the ring is full the oldest entry is evicted.
//!
//! [`TelemetryState`] has no interior locking. Callers that share it across
//! tasks must serialize access themselves.

use std::collections::VecDeque;

use chrono::Utc;
use serde::Serialize;

use crate::error::CoreError;
use crate::reading::{parse_gas, parse_ppm, Reading, SensorField};
use crate::types::Timestamp;

/// Default number of readings retained in history.
pub const DEFAULT_MAX_HISTORY: usize = 200;

/// Point-in-time copy of the telemetry state.
///
/// Serializes as the latest reading's fields with the `history` array
/// alongside: `{gas, ppm, status, timestamp, history}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    #[serde(flatten)]
    pub latest: Reading,
    pub history: Vec<Reading>,
}

/// Latest reading and bounded FIFO history.
#[derive(Debug, Clone)]
pub struct TelemetryState {
    latest: Reading,
    history: VecDeque<Reading>,
    max_history: usize,
}

impl TelemetryState {
    /// Create a state with the default history capacity.
    pub fn new() -> Self {
        Self::build(DEFAULT_MAX_HISTORY, Utc::now())
    }

    /// Create a state that retains at most `max_history` readings.
    pub fn with_capacity(max_history: usize) -> Result<Self, CoreError> {
        if max_history == 0 {
            return Err(CoreError::ZeroHistoryCapacity);
        }
        Ok(Self::build(max_history, Utc::now()))
    }

    fn build(max_history: usize, at: Timestamp) -> Self {
        Self {
            latest: Reading::initial(at),
            history: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Apply one raw sensor value to `field`, stamped with the current time.
    pub fn update_field(&mut self, field: SensorField, raw: &str) {
        self.update_field_at(field, raw, Utc::now());
    }

    /// Apply one raw sensor value to `field`, stamped with `at`.
    ///
    /// Numeric fields that fail to parse are stored as zero.
    pub fn update_field_at(&mut self, field: SensorField, raw: &str, at: Timestamp) {
        match field {
            SensorField::Gas => self.latest.gas = parse_gas(raw),
            SensorField::Ppm => self.latest.ppm = parse_ppm(raw),
            SensorField::Status => self.latest.status = raw.to_string(),
        }
        self.latest.timestamp = at;

        while self.history.len() >= self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(self.latest.clone());
    }

    /// Drop every history entry. The latest reading is kept.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn latest(&self) -> &Reading {
        &self.latest
    }

    /// History entries, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &Reading> + '_ {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            latest: self.latest.clone(),
            history: self.history.iter().cloned().collect(),
        }
    }
}

impl Default for TelemetryState {
    fn default() -> Self {
        Self::new()
    }
}
