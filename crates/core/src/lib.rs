//! Gaswatch core domain types.
//!
//! Pure logic with no I/O: the sensor [`Reading`](reading::Reading), the
//! bounded [`TelemetryState`](telemetry::TelemetryState), the topic-to-field
//! table and the JSON envelopes pushed to live-view clients.

pub mod error;
pub mod messages;
pub mod reading;
pub mod telemetry;
pub mod topics;
pub mod types;
