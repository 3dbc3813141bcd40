use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time;
use tracing::{debug, error, info};

use crate::metrics::IngestMetrics;
use crate::store::{LogStore, StoreResult};

/// Oldest timestamp kept when retaining `days` days of logs.
pub fn cutoff(days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now - chrono::Duration::days(i64::from(days))
}

/// Delete every log older than `days` days. Returns the number removed.
pub fn purge_expired(store: &dyn LogStore, days: u32, now: DateTime<Utc>) -> StoreResult<usize> {
    let cutoff = cutoff(days, now);
    let deleted = store.purge_older_than(cutoff)?;
    if deleted > 0 {
        info!(deleted, %cutoff, "Removed expired logs");
    } else {
        debug!(%cutoff, "No expired logs");
    }
    Ok(deleted)
}

/// Periodic retention sweep, stopped through the shutdown channel.
pub struct RetentionSweeper {
    store: Arc<dyn LogStore>,
    metrics: IngestMetrics,
    days: u32,
    interval: Duration,
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn LogStore>,
        metrics: IngestMetrics,
        days: u32,
        interval: Duration,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            metrics,
            days,
            interval,
            shutdown_rx,
        }
    }

    pub async fn run(mut self) {
        info!(
            "Starting retention sweep (keep {} days, interval: {}s)",
            self.days,
            self.interval.as_secs()
        );

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // The first tick completes immediately; startup already purged.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep().await;
                }
                changed = self.shutdown_rx.changed() => {
                    if changed.is_err() || *self.shutdown_rx.borrow() {
                        info!("Received shutdown signal, stopping retention sweep");
                        break;
                    }
                }
            }
        }
    }

    async fn sweep(&self) {
        let store = self.store.clone();
        let days = self.days;
        let result =
            tokio::task::spawn_blocking(move || purge_expired(store.as_ref(), days, Utc::now())).await;

        match result {
            Ok(Ok(deleted)) => self.metrics.logs_purged(deleted),
            Ok(Err(e)) => error!("Retention sweep failed: {}", e),
            Err(e) => error!("Retention sweep task panicked: {}", e),
        }
    }
}
