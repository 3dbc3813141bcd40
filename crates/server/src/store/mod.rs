//! Log persistence.
//!
//! Handlers only ever see [`LogStore`]; the concrete backend is chosen from
//! configuration at boot.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use insight::{PreparedLog, Severity, StoredLog};
use serde::Deserialize;
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("body encoding: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait LogStore: Send + Sync {
    /// Short backend name for diagnostics.
    fn backend(&self) -> &'static str;

    fn insert(&self, log: PreparedLog, timestamp: DateTime<Utc>) -> StoreResult<StoredLog>;

    /// Filtered page, newest first.
    fn query(&self, query: &LogQuery) -> StoreResult<Vec<StoredLog>>;

    /// Everything inside `range`, newest first.
    fn export(&self, range: &ExportRange) -> StoreResult<Vec<StoredLog>>;

    /// Every stored log, for analytics.
    fn snapshot(&self) -> StoreResult<Vec<StoredLog>>;

    /// Delete logs strictly older than `cutoff`, returning how many went.
    fn purge_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<usize>;

    fn ping(&self) -> StoreResult<()>;

    /// On-disk footprint, when the backend has one.
    fn size_bytes(&self) -> StoreResult<Option<u64>>;
}

pub fn open_store(config: &StorageConfig) -> anyhow::Result<Arc<dyn LogStore>> {
    Ok(match config.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => Arc::new(
            SqliteStore::open(&config.path)
                .with_context(|| format!("Failed to open database '{}'", config.path))?,
        ),
    })
}

// ─────────────────────────────────────────────────────────
// Query types
// ─────────────────────────────────────────────────────────

pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;
pub const MAX_OFFSET: usize = 1_000_000;

/// Raw `GET /api/logs` query string.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub log_type: Option<String>,
    pub color: Option<String>,
    pub severity: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    /// Substring of title, description or body
    pub search: Option<String>,
    pub log_type: Option<String>,
    pub color: Option<String>,
    pub severity: Option<Severity>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            search: None,
            log_type: None,
            color: None,
            severity: None,
            since: None,
            until: None,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl LogQuery {
    /// `from` selects one calendar day; `to` is an upper bound only when
    /// `from` is absent. Out-of-range paging falls back to defaults.
    pub fn from_params(params: LogQueryParams) -> Result<Self, String> {
        let (since, until) = match (non_empty(params.from), non_empty(params.to)) {
            (Some(day), _) => {
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map_err(|_| format!("invalid date '{}' - expected YYYY-MM-DD", day))?;
                let start = date.and_time(NaiveTime::MIN).and_utc();
                (Some(start), Some(start + Duration::days(1) - Duration::microseconds(1)))
            }
            (None, Some(to)) => (None, Some(parse_bound(&to, true)?)),
            (None, None) => (None, None),
        };

        let severity = match non_empty(params.severity) {
            Some(s) => Some(Severity::parse(&s).ok_or_else(|| format!("invalid severity '{}'", s))?),
            None => None,
        };

        Ok(Self {
            search: non_empty(params.q),
            log_type: non_empty(params.log_type),
            color: non_empty(params.color),
            severity,
            since,
            until,
            limit: bounded(params.limit, DEFAULT_LIMIT, 1, MAX_LIMIT),
            offset: bounded(params.offset, 0, 0, MAX_OFFSET),
        })
    }

    pub fn matches(&self, log: &StoredLog) -> bool {
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let body = serde_json::to_string(&log.body).unwrap_or_default();
            let hit = [log.header.title.as_str(), log.header.description.as_str(), body.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.log_type.as_ref().is_some_and(|t| *t != log.header.log_type) {
            return false;
        }
        if self.color.as_ref().is_some_and(|c| *c != log.header.color) {
            return false;
        }
        if self.severity.is_some() && self.severity != log.severity() {
            return false;
        }
        within(log.timestamp, self.since, self.until)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportParams {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Inclusive time window for exports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl ExportRange {
    pub fn from_params(params: ExportParams) -> Result<Self, String> {
        Ok(Self {
            from: non_empty(params.from).map(|s| parse_bound(&s, false)).transpose()?,
            to: non_empty(params.to).map(|s| parse_bound(&s, true)).transpose()?,
        })
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        within(timestamp, self.from, self.to)
    }
}

fn within(ts: DateTime<Utc>, since: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) -> bool {
    since.map_or(true, |s| ts >= s) && until.map_or(true, |u| ts <= u)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn bounded(raw: Option<String>, default: usize, min: usize, max: usize) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|v| (min..=max).contains(v))
        .unwrap_or(default)
}

/// RFC 3339 timestamp or `YYYY-MM-DD`. A bare date used as an upper bound
/// covers that whole day.
pub fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' - expected RFC 3339 or YYYY-MM-DD", value))?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    Ok(if end_of_day {
        start + Duration::days(1) - Duration::microseconds(1)
    } else {
        start
    })
}
