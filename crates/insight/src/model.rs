use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unstructured log payload. May be nested arbitrarily.
pub type Body = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Outage-level signal (security hit, exhausted resources)
    Critical,
    Error,
    Warning,
    Success,
    Debug,
    /// Default when nothing more specific matched
    Info,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Success,
        Severity::Debug,
        Severity::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Debug => "debug",
            Severity::Info => "info",
        }
    }

    /// Lenient parse of a level-ish word (`"WARN"`, `"fatal"`, `"ok"`...).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "critical" | "crit" | "fatal" | "emergency" | "emerg" | "alert" | "panic" => {
                Some(Severity::Critical)
            }
            "error" | "err" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "success" | "ok" | "succeeded" => Some(Severity::Success),
            "debug" | "trace" | "verbose" => Some(Severity::Debug),
            "info" | "information" | "notice" => Some(Severity::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured part of an incoming log. Empty strings mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogHeader {
    #[serde(rename = "type", default)]
    pub log_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub color: String,
}

impl LogHeader {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Ingest input: header plus freestyle JSON body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub header: LogHeader,
    #[serde(default)]
    pub body: Body,
}

/// Derived once per entry at ingest time and persisted alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedMetadata {
    pub severity: Severity,
    pub source: String,
    pub category: String,
}

/// A persisted log as read back from storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredLog {
    pub id: i64,
    pub header: LogHeader,
    pub body: Body,
    pub timestamp: DateTime<Utc>,
    /// `None` for rows written before derivation existed
    pub derived: Option<DerivedMetadata>,
}

impl StoredLog {
    pub fn severity(&self) -> Option<Severity> {
        self.derived.as_ref().map(|d| d.severity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,

    #[error("invalid color '{0}' - must be a valid Tailwind CSS 4 color name")]
    InvalidColor(String),
}
