use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use insight::{PreparedLog, StoredLog};
use parking_lot::RwLock;

use super::{ExportRange, LogQuery, LogStore, StoreResult};

/// Volatile store for development and tests. Nothing survives a restart.
pub struct MemoryStore {
    logs: RwLock<Vec<StoredLog>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }

    fn newest_first(mut logs: Vec<StoredLog>) -> Vec<StoredLog> {
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        logs
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn insert(&self, log: PreparedLog, timestamp: DateTime<Utc>) -> StoreResult<StoredLog> {
        let stored = StoredLog {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            header: log.header,
            body: log.body,
            timestamp,
            derived: Some(log.derived),
        };
        self.logs.write().push(stored.clone());
        Ok(stored)
    }

    fn query(&self, query: &LogQuery) -> StoreResult<Vec<StoredLog>> {
        let matching: Vec<StoredLog> = self
            .logs
            .read()
            .iter()
            .filter(|log| query.matches(log))
            .cloned()
            .collect();

        Ok(Self::newest_first(matching)
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    fn export(&self, range: &ExportRange) -> StoreResult<Vec<StoredLog>> {
        let matching = self
            .logs
            .read()
            .iter()
            .filter(|log| range.contains(log.timestamp))
            .cloned()
            .collect();
        Ok(Self::newest_first(matching))
    }

    fn snapshot(&self) -> StoreResult<Vec<StoredLog>> {
        Ok(self.logs.read().clone())
    }

    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize> {
        let mut logs = self.logs.write();
        let before = logs.len();
        logs.retain(|log| log.timestamp >= cutoff);
        Ok(before - logs.len())
    }

    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn size_bytes(&self) -> StoreResult<Option<u64>> {
        Ok(None)
    }
}
