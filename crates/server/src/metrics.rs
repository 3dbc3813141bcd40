use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use insight::Severity;
use serde::Serialize;

/// Ingest counters exposed on `/metrics`
#[derive(Clone)]
pub struct IngestMetrics {
    inner: Arc<IngestMetricsInner>,
}

struct IngestMetricsInner {
    /// Logs stored (lifetime)
    accepted: AtomicU64,

    /// Logs refused for bad JSON or failed validation
    rejected: AtomicU64,

    /// Accepted logs per derived severity, indexed like `Severity::ALL`
    by_severity: [AtomicU64; 6],

    stats_requests: AtomicU64,
    exports: AtomicU64,
    purged: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub accepted: u64,
    pub rejected: u64,
    pub by_severity: BTreeMap<Severity, u64>,
    pub stats_requests: u64,
    pub exports: u64,
    pub purged: u64,
}

fn severity_slot(severity: Severity) -> usize {
    Severity::ALL
        .iter()
        .position(|s| *s == severity)
        .unwrap_or(Severity::ALL.len() - 1)
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(IngestMetricsInner {
                accepted: AtomicU64::new(0),
                rejected: AtomicU64::new(0),
                by_severity: Default::default(),
                stats_requests: AtomicU64::new(0),
                exports: AtomicU64::new(0),
                purged: AtomicU64::new(0),
            }),
        }
    }

    /// Called after a log is stored
    pub fn log_accepted(&self, severity: Severity) {
        self.inner.accepted.fetch_add(1, Ordering::Relaxed);
        self.inner.by_severity[severity_slot(severity)].fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            severity = %severity,
            accepted = self.inner.accepted.load(Ordering::Relaxed),
            "Log accepted"
        );
    }

    pub fn log_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats_requested(&self) {
        self.inner.stats_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn export_requested(&self) {
        self.inner.exports.fetch_add(1, Ordering::Relaxed);
    }

    /// Called by retention with the number of rows removed
    pub fn logs_purged(&self, count: usize) {
        self.inner.purged.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let by_severity = Severity::ALL
            .iter()
            .zip(self.inner.by_severity.iter())
            .map(|(severity, count)| (*severity, count.load(Ordering::Relaxed)))
            .filter(|(_, count)| *count > 0)
            .collect();

        MetricsSnapshot {
            accepted: self.inner.accepted.load(Ordering::Relaxed),
            rejected: self.inner.rejected.load(Ordering::Relaxed),
            by_severity,
            stats_requests: self.inner.stats_requests.load(Ordering::Relaxed),
            exports: self.inner.exports.load(Ordering::Relaxed),
            purged: self.inner.purged.load(Ordering::Relaxed),
        }
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}
