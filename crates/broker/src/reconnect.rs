//! Fixed-interval reconnection delay for the broker connection.
//!
//! After a failed attempt or a dropped session the connection loop waits a
//! constant [`BrokerConfig::reconnect_period`](crate::BrokerConfig) before
//! polling again. There is no backoff; the wait only ends early when the
//! [`CancellationToken`] fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleep for `delay` unless `cancel` fires first.
///
/// Returns `true` if the full delay elapsed, `false` if cancelled.
pub async fn wait_before_retry(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elapsed_delay_returns_true() {
        let cancel = CancellationToken::new();
        assert!(wait_before_retry(Duration::from_millis(5), &cancel).await);
    }

    #[tokio::test]
    async fn cancellation_token_stops_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let started = std::time::Instant::now();
        assert!(!wait_before_retry(Duration::from_secs(60), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn cancel_during_wait_returns_false() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        assert!(!wait_before_retry(Duration::from_secs(60), &cancel).await);
    }
}
