use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};

use crate::hub::TelemetryHub;

/// Period between live-view keepalive pings.
pub const KEEPALIVE_PERIOD: Duration = Duration::from_secs(30);

/// Spawn the live-view keepalive task.
///
/// Every `period` each open sink gets a Ping frame and sinks whose socket
/// writer has gone away are dropped from the hub. Between sensor events this
/// is the only thing that notices dead live-view clients. The first ping goes
/// out one full period after start. Runs until aborted.
pub fn start_heartbeat(hub: Arc<TelemetryHub>, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let before = hub.sink_count().await;
            let pinged = hub.ping_all().await;
            if before > pinged {
                tracing::debug!(pinged, pruned = before - pinged, "Live-view keepalive");
            } else {
                tracing::trace!(pinged, "Live-view keepalive");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use axum::extract::ws::Message;

    use super::*;

    #[tokio::test]
    async fn pings_open_sinks_and_prunes_closed_ones() {
        let hub = Arc::new(TelemetryHub::new(10).unwrap());
        let mut open = hub.connect_sink("open".to_string()).await;
        let closed = hub.connect_sink("closed".to_string()).await;
        drop(closed);
        assert!(matches!(open.try_recv(), Ok(Message::Text(_))));

        let handle = start_heartbeat(Arc::clone(&hub), Duration::from_millis(20));

        let frame = tokio::time::timeout(Duration::from_secs(5), open.recv())
            .await
            .expect("keepalive ping should arrive");
        assert!(matches!(frame, Some(Message::Ping(_))));
        assert_eq!(hub.sink_count().await, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn first_ping_waits_one_period() {
        let hub = Arc::new(TelemetryHub::new(10).unwrap());
        let mut rx = hub.connect_sink("conn-1".to_string()).await;
        rx.try_recv().unwrap();

        let handle = start_heartbeat(Arc::clone(&hub), Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(rx.try_recv().is_err());
        handle.abort();
    }
}
