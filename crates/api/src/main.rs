use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gaswatch_api::config::{load_env_files, ServerConfig};
use gaswatch_api::hub::TelemetryHub;
use gaswatch_api::ingest::{IngestionAdapter, EVENT_CHANNEL_CAPACITY};
use gaswatch_api::router::build_app_router;
use gaswatch_api::state::AppState;
use gaswatch_api::ws;

#[tokio::main]
async fn main() {
    load_env_files();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gaswatch_api=debug,gaswatch_broker=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.host,
        port = config.port,
        broker = %config.mqtt.host,
        broker_port = config.mqtt.port,
        max_history = config.max_history,
        "Loaded server configuration",
    );

    let addr = match config.host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, config.port),
        Err(e) => {
            tracing::error!(host = %config.host, error = %e, "Invalid HOST address");
            std::process::exit(1);
        }
    };

    // --- Telemetry hub ---
    let hub = match TelemetryHub::new(config.max_history) {
        Ok(hub) => Arc::new(hub),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create telemetry hub");
            std::process::exit(1);
        }
    };

    // --- Heartbeat ---
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&hub), ws::KEEPALIVE_PERIOD);

    // --- Broker connection + ingestion ---
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let broker_cancel = CancellationToken::new();
    let broker_handle =
        gaswatch_broker::spawn(config.mqtt.broker_config(), event_tx, broker_cancel.clone());

    let adapter = IngestionAdapter::new(Arc::clone(&hub), config.mqtt.topics.clone());
    let ingest_handle = tokio::spawn(adapter.run(event_rx));

    tracing::info!("Broker services started (connection, ingestion)");

    // --- App state + router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        hub: Arc::clone(&hub),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    tracing::info!(%addr, static_dir = %config.static_dir.display(), "Starting server");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stopping the connection task drops the event sender, which ends
    // ingestion once the remaining events are applied.
    broker_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), broker_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), ingest_handle).await;
    tracing::info!("Broker services shut down");

    hub.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
