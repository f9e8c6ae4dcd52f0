//! Gaswatch API server library.
//!
//! Exposes the building blocks (config, telemetry hub, ingestion adapter,
//! routes, WebSocket infrastructure) so integration tests and the binary
//! entrypoint can both access them.

pub mod config;
pub mod handlers;
pub mod hub;
pub mod ingest;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
