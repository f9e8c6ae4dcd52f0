//! MQTT broker transport for the gaswatch bridge.
//!
//! Provides broker connection settings, client construction, the
//! connect -> subscribe -> receive -> reconnect loop, and the
//! [`BrokerEvent`] stream consumed by the ingestion side.

pub mod client;
pub mod config;
pub mod connection;
pub mod events;
pub mod reconnect;

pub use client::BrokerError;
pub use config::BrokerConfig;
pub use connection::{run, spawn};
pub use events::BrokerEvent;
