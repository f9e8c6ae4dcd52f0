//! WebSocket infrastructure for the live view.
//!
//! Provides the sink registry, heartbeat monitoring, and the HTTP upgrade
//! handlers used by Axum routes.

mod handler;
mod heartbeat;
pub mod registry;

pub use handler::{root_handler, ws_handler};
pub use heartbeat::{start_heartbeat, KEEPALIVE_PERIOD};
pub use registry::SinkRegistry;
