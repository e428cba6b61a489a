use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use snippet_engine::ReadConfig;

/// Ticket handed out by [`LatestRequest::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Last-request-wins coordination for reads.
///
/// Every read takes a ticket from a monotonically increasing counter. A read
/// waits out the debounce before running and its result is dropped when a
/// newer ticket was issued meanwhile.
#[derive(Debug)]
pub struct LatestRequest {
    counter: AtomicU64,
    debounce: Duration,
}

impl LatestRequest {
    pub fn new(debounce: Duration) -> Self {
        Self {
            counter: AtomicU64::new(0),
            debounce,
        }
    }

    pub fn from_config(config: &ReadConfig) -> Self {
        Self::new(config.debounce())
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.counter.load(Ordering::SeqCst) == ticket.0
    }

    /// Debounce, run `read`, and keep its result only if `ticket` is still
    /// the latest
    pub async fn settle<T, Fut>(&self, ticket: Ticket, read: Fut) -> Option<T>
    where
        Fut: Future<Output = T>,
    {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        if !self.is_current(ticket) {
            tracing::debug!(ticket = ticket.0, "read superseded during debounce");
            return None;
        }

        let value = read.await;
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(ticket = ticket.0, "discarding stale read result");
            None
        }
    }

    pub async fn run<T, Fut>(&self, read: Fut) -> Option<T>
    where
        Fut: Future<Output = T>,
    {
        let ticket = self.begin();
        self.settle(ticket, read).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_latest_read_wins() {
        let latest = LatestRequest::new(Duration::ZERO);
        let first = latest.begin();
        let second = latest.begin();
        assert!(first < second);
        assert_eq!(latest.settle(first, async { 1 }).await, None);
        assert_eq!(latest.settle(second, async { 2 }).await, Some(2));
    }

    #[tokio::test]
    async fn test_slow_result_discarded_after_newer_request() {
        let latest = Arc::new(LatestRequest::new(Duration::ZERO));
        let (release, gate) = oneshot::channel::<()>();

        let ticket = latest.begin();
        let slow = {
            let latest = latest.clone();
            tokio::spawn(async move {
                latest
                    .settle(ticket, async move {
                        let _ = gate.await;
                        "slow"
                    })
                    .await
            })
        };

        let newer = latest.begin();
        let _ = release.send(());
        assert_eq!(slow.await.unwrap(), None);
        assert_eq!(latest.settle(newer, async { "fast" }).await, Some("fast"));
    }

    #[tokio::test]
    async fn test_debounced_burst_keeps_last() {
        let latest = Arc::new(LatestRequest::new(Duration::from_millis(10)));
        let tickets: Vec<_> = (0..5).map(|_| latest.begin()).collect();
        let results = futures::future::join_all(
            tickets
                .into_iter()
                .enumerate()
                .map(|(i, ticket)| latest.settle(ticket, async move { i })),
        )
        .await;
        assert_eq!(results, vec![None, None, None, None, Some(4)]);
    }
}
