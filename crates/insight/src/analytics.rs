//! Aggregate statistics over stored logs.
//!
//! Works on a borrowed snapshot and never mutates it, so it can run while
//! ingestion continues elsewhere.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

use crate::derive::{Signals, FALLBACK_SOURCE};
use crate::model::{Severity, StoredLog};

const TOP_N: usize = 10;
const HIGH_ERROR_RATE_PERCENT: f64 = 20.0;
const UNKNOWN_SOURCE_MIN_RECENT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trends {
    pub errors_increasing: bool,
    /// Errors in the last 24h minus errors in the 24h before that
    pub error_change: i64,
    pub spike_detected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatternStats {
    pub http: usize,
    pub stack_trace: usize,
    pub security: usize,
    pub performance: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    pub total: usize,
    pub last_24h: usize,
    pub severity_breakdown: BTreeMap<Severity, usize>,
    pub top_types: Vec<NameCount>,
    pub top_sources: Vec<NameCount>,
    pub error_rate_24h: String,
    pub peak_hour: String,
    pub trends: Trends,
    pub hourly_distribution: [usize; 24],
    pub alerts: Vec<String>,
    pub pattern_stats: PatternStats,
    pub detection_accuracy: String,
}

pub fn aggregate(entries: &[StoredLog], now: DateTime<Utc>) -> AggregateStats {
    let day_ago = now - Duration::hours(24);
    let two_days_ago = now - Duration::hours(48);

    let mut severity_breakdown = BTreeMap::new();
    let mut types: HashMap<&str, usize> = HashMap::new();
    let mut sources: HashMap<&str, usize> = HashMap::new();
    let mut hourly = [0usize; 24];
    let mut pattern_stats = PatternStats::default();

    let mut last_24h = 0usize;
    let mut errors_recent = 0i64;
    let mut errors_previous = 0i64;
    let mut unknown_recent = 0usize;
    let mut classified = 0usize;

    for entry in entries {
        let recent = entry.timestamp >= day_ago;
        let previous = entry.timestamp >= two_days_ago && entry.timestamp < day_ago;
        let severity = entry.severity();

        if let Some(severity) = severity {
            *severity_breakdown.entry(severity).or_insert(0) += 1;
            if severity != Severity::Info {
                classified += 1;
            }
        }
        if let Some(derived) = &entry.derived {
            *types.entry(derived.category.as_str()).or_insert(0) += 1;
            *sources.entry(derived.source.as_str()).or_insert(0) += 1;
        }

        let is_error = severity == Some(Severity::Error);
        if recent {
            last_24h += 1;
            hourly[entry.timestamp.hour() as usize] += 1;
            if is_error {
                errors_recent += 1;
            }
            if entry
                .derived
                .as_ref()
                .is_some_and(|d| d.source == FALLBACK_SOURCE)
            {
                unknown_recent += 1;
            }
        } else if previous && is_error {
            errors_previous += 1;
        }

        let signals = Signals::collect(&entry.header, &entry.body);
        pattern_stats.http += signals.http_status.is_some() as usize;
        pattern_stats.stack_trace += signals.stack_trace as usize;
        pattern_stats.security += signals.security as usize;
        pattern_stats.performance += signals.has_performance() as usize;
    }

    let error_rate = percentage(errors_recent as usize, last_24h);
    let spike_detected = spike(&hourly, now.hour() as usize);

    let mut alerts = Vec::new();
    if error_rate > HIGH_ERROR_RATE_PERCENT {
        alerts.push(format!("High error rate detected: {:.1}%", error_rate));
    }
    if spike_detected {
        alerts.push("Unusual spike in logs detected in the current hour".to_string());
    }
    if last_24h > UNKNOWN_SOURCE_MIN_RECENT && unknown_recent * 4 > last_24h {
        alerts.push(format!("{} logs from unknown sources in last 24h", unknown_recent));
    }

    AggregateStats {
        total: entries.len(),
        last_24h,
        severity_breakdown,
        top_types: top_n(types),
        top_sources: top_n(sources),
        error_rate_24h: format!("{:.1}%", error_rate),
        peak_hour: format!("{:02}:00", peak_hour(&hourly)),
        trends: Trends {
            errors_increasing: errors_recent > errors_previous,
            error_change: errors_recent - errors_previous,
            spike_detected,
        },
        hourly_distribution: hourly,
        alerts,
        pattern_stats,
        detection_accuracy: if entries.is_empty() {
            "N/A".to_string()
        } else {
            format!("{:.1}%", percentage(classified, entries.len()))
        },
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Count desc, then name asc, truncated.
fn top_n(counts: HashMap<&str, usize>) -> Vec<NameCount> {
    let mut ranked: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount {
            name: name.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(TOP_N);
    ranked
}

/// Lowest hour wins ties.
fn peak_hour(hourly: &[usize; 24]) -> usize {
    let mut peak = 0;
    for (hour, count) in hourly.iter().enumerate() {
        if *count > hourly[peak] {
            peak = hour;
        }
    }
    peak
}

/// Current-hour bucket above twice the integer hourly average.
fn spike(hourly: &[usize; 24], current_hour: usize) -> bool {
    let average = hourly.iter().sum::<usize>() / hourly.len();
    average > 0 && hourly[current_hour] > 2 * average
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Body, DerivedMetadata, LogHeader};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 30, 0).unwrap()
    }

    fn log(id: i64, severity: Severity, source: &str, hours_ago: i64) -> StoredLog {
        StoredLog {
            id,
            header: LogHeader::titled(format!("entry {}", id)),
            body: Body::new(),
            timestamp: now() - Duration::hours(hours_ago),
            derived: Some(DerivedMetadata {
                severity,
                source: source.to_string(),
                category: severity.as_str().to_string(),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Empty input
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_empty_input_is_well_defined() {
        let stats = aggregate(&[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.last_24h, 0);
        assert_eq!(stats.error_rate_24h, "0.0%");
        assert_eq!(stats.detection_accuracy, "N/A");
        assert_eq!(stats.peak_hour, "00:00");
        assert!(stats.severity_breakdown.is_empty());
        assert!(stats.top_types.is_empty());
        assert!(stats.alerts.is_empty());
        assert_eq!(stats.trends, Trends::default());
    }

    // ─────────────────────────────────────────────────────────
    // Rates & alerts
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_error_rate_one_in_three() {
        let entries = vec![
            log(1, Severity::Error, "api", 1),
            log(2, Severity::Info, "api", 2),
            log(3, Severity::Success, "api", 3),
        ];
        let stats = aggregate(&entries, now());
        assert_eq!(stats.error_rate_24h, "33.3%");
        assert!(stats.alerts.iter().any(|a| a.contains("33.3%")), "alerts: {:?}", stats.alerts);
    }

    #[test]
    fn test_low_error_rate_has_no_alerts() {
        let mut entries: Vec<StoredLog> = (0..10)
            .map(|i| log(i, Severity::Info, "api", i % 24))
            .collect();
        entries.push(log(10, Severity::Error, "api", 5));
        let stats = aggregate(&entries, now());
        assert_eq!(stats.error_rate_24h, "9.1%");
        assert!(stats.alerts.is_empty(), "alerts: {:?}", stats.alerts);
    }

    #[test]
    fn test_only_error_counts_toward_error_rate() {
        let entries = vec![
            log(1, Severity::Critical, "api", 1),
            log(2, Severity::Info, "api", 1),
        ];
        assert_eq!(aggregate(&entries, now()).error_rate_24h, "0.0%");
    }

    #[test]
    fn test_unknown_source_alert() {
        let entries: Vec<StoredLog> = (0..12)
            .map(|i| {
                let source = if i < 4 { FALLBACK_SOURCE } else { "api" };
                log(i, Severity::Info, source, (i % 12) + 1)
            })
            .collect();
        let stats = aggregate(&entries, now());
        assert!(
            stats.alerts.contains(&"4 logs from unknown sources in last 24h".to_string()),
            "alerts: {:?}",
            stats.alerts
        );
    }

    #[test]
    fn test_unknown_source_alert_needs_volume() {
        let entries: Vec<StoredLog> = (0..5)
            .map(|i| log(i, Severity::Info, FALLBACK_SOURCE, i + 1))
            .collect();
        assert!(aggregate(&entries, now()).alerts.is_empty());
    }

    #[test]
    fn test_spike_in_current_hour() {
        // 30 logs at 12:xx, one in each of 11 earlier hours: avg 41/24 = 1
        let mut entries: Vec<StoredLog> = (0..30).map(|i| log(i, Severity::Info, "api", 0)).collect();
        entries.extend((1..=11).map(|h| log(100 + h, Severity::Info, "api", h)));

        let stats = aggregate(&entries, now());
        assert!(stats.trends.spike_detected);
        assert!(stats
            .alerts
            .contains(&"Unusual spike in logs detected in the current hour".to_string()));
        assert_eq!(stats.peak_hour, "12:00");
    }

    // ─────────────────────────────────────────────────────────
    // Windows & breakdowns
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_trend_compares_consecutive_days() {
        let entries = vec![
            log(1, Severity::Error, "api", 1),
            log(2, Severity::Error, "api", 2),
            log(3, Severity::Error, "api", 3),
            log(4, Severity::Error, "api", 30),
            log(5, Severity::Error, "api", 80),
        ];
        let stats = aggregate(&entries, now());
        assert_eq!(stats.total, 5);
        assert_eq!(stats.last_24h, 3);
        assert!(stats.trends.errors_increasing);
        assert_eq!(stats.trends.error_change, 2);
    }

    #[test]
    fn test_top_lists_sorted_and_truncated() {
        let mut entries = Vec::new();
        for (i, source) in ["b", "a", "a", "c", "c", "c"].iter().enumerate() {
            entries.push(log(i as i64, Severity::Info, source, 1));
        }
        for i in 0..12 {
            entries.push(log(100 + i, Severity::Info, &format!("s{:02}", i), 1));
        }
        let stats = aggregate(&entries, now());
        let names: Vec<_> = stats.top_sources.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(stats.top_sources.len(), 10);
        assert_eq!(&names[..4], &["c", "a", "b", "s00"]);
    }

    #[test]
    fn test_hourly_distribution_uses_utc_hour() {
        let entries = vec![log(1, Severity::Info, "api", 2), log(2, Severity::Info, "api", 25)];
        let stats = aggregate(&entries, now());
        assert_eq!(stats.hourly_distribution[10], 1);
        assert_eq!(stats.hourly_distribution.iter().sum::<usize>(), 1);
        assert_eq!(stats.peak_hour, "10:00");
    }

    #[test]
    fn test_peak_hour_ties_go_to_lowest_hour() {
        let entries = vec![log(1, Severity::Info, "api", 2), log(2, Severity::Info, "api", 4)];
        assert_eq!(aggregate(&entries, now()).peak_hour, "08:00");
    }

    #[test]
    fn test_legacy_rows_skip_breakdowns() {
        let mut legacy = log(1, Severity::Info, "api", 1);
        legacy.derived = None;
        let stats = aggregate(&[legacy, log(2, Severity::Warning, "api", 1)], now());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.severity_breakdown.get(&Severity::Warning), Some(&1));
        assert_eq!(stats.severity_breakdown.values().sum::<usize>(), 1);
        assert_eq!(stats.detection_accuracy, "50.0%");
    }

    #[test]
    fn test_pattern_stats_rescan_content() {
        let mut http = log(1, Severity::Error, "api", 1);
        http.header.title = "GET /x status 500".into();
        let mut trace = log(2, Severity::Error, "api", 1);
        trace.header.description = "Traceback (most recent call last):".into();
        let mut slow = log(3, Severity::Warning, "api", 1);
        slow.header.title = "report took 2.4s".into();

        let stats = aggregate(&[http, trace, slow], now());
        assert_eq!(
            stats.pattern_stats,
            PatternStats {
                http: 1,
                stack_trace: 1,
                security: 0,
                performance: 1,
            }
        );
    }

    #[test]
    fn test_stats_serialize_with_expected_keys() {
        let json = serde_json::to_value(aggregate(&[log(1, Severity::Error, "api", 1)], now())).unwrap();
        for key in [
            "total",
            "last_24h",
            "severity_breakdown",
            "top_types",
            "top_sources",
            "error_rate_24h",
            "peak_hour",
            "trends",
            "hourly_distribution",
            "alerts",
            "pattern_stats",
            "detection_accuracy",
        ] {
            assert!(json.get(key).is_some(), "missing key {}", key);
        }
        assert_eq!(json["severity_breakdown"]["error"], 1);
        assert_eq!(json["hourly_distribution"].as_array().map(Vec::len), Some(24));
    }
}
