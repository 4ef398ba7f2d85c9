//! Periodic full flush of the session store.
//!
//! Coarse global reset, not per-key expiry: every `period` the whole table is
//! cleared. Owned by the process lifecycle and stopped through a `watch`
//! channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

use crate::session::SessionStore;

/// Background task that evicts all session state on a fixed period.
pub struct SessionFlusher {
    store: Arc<SessionStore>,
    period: Duration,
}

impl SessionFlusher {
    pub fn new(store: Arc<SessionStore>, period: Duration) -> Self {
        Self { store, period }
    }

    /// Drive the flush loop until `shutdown` becomes `true` or its sender is dropped.
    ///
    /// The first flush happens one full `period` after start.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(period_secs = self.period.as_secs(), "session flusher started");

        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let evicted = self.store.clear();
                    info!(evicted, "session flush: cleaned {evicted} items");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("session flusher shutting down");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ConversationId, PendingResultSet};

    fn fill(store: &SessionStore, n: i64) {
        for i in 0..n {
            store.put_pending(ConversationId(i), PendingResultSet::new("q", Vec::new()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn clears_once_per_period() {
        let store = Arc::new(SessionStore::new());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(SessionFlusher::new(Arc::clone(&store), Duration::from_secs(60)).run(rx));

        fill(&store, 3);
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(store.size(), 3);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.size(), 0);

        fill(&store, 2);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.size(), 0);

        tx.send(true).unwrap();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_shutdown_signal() {
        let store = Arc::new(SessionStore::new());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(SessionFlusher::new(Arc::clone(&store), Duration::from_secs(10)).run(rx));

        tx.send(true).unwrap();
        task.await.unwrap();

        fill(&store, 2);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(store.size(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_sender_dropped() {
        let store = Arc::new(SessionStore::new());
        let (tx, rx) = watch::channel(false);
        let task = tokio::spawn(SessionFlusher::new(store, Duration::from_secs(10)).run(rx));
        drop(tx);
        task.await.unwrap();
    }
}
