use std::sync::Arc;

use crate::config::CubicConfig;
use crate::metrics::IngestMetrics;
use crate::store::LogStore;

/// Shared application state (thread-safe)
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CubicConfig>,
    pub store: Arc<dyn LogStore>,
    pub metrics: IngestMetrics,
    /// Background tasks watch this and stop once it flips to `true`.
    pub shutdown_tx: tokio::sync::watch::Sender<bool>,
}

impl AppState {
    pub fn new(config: CubicConfig, store: Arc<dyn LogStore>) -> Self {
        let (shutdown_tx, _) = tokio::sync::watch::channel(false);

        Self {
            config: Arc::new(config),
            store,
            metrics: IngestMetrics::new(),
            shutdown_tx,
        }
    }

    /// Signal shutdown to all components
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
