use tracing::trace;

use super::signals::Signals;
use crate::detect::{contains_any_keyword, extract_percentage};
use crate::model::Severity;
use crate::patterns::{
    duration_severity, http_range_severity, DEBUG_KEYWORDS, ERROR_KEYWORDS, HTTP_STATUS_SEVERITY,
    RESOURCE_CONTEXTS, RESOURCE_CRITICAL_PERCENT, RESOURCE_WARNING_PERCENT, SUCCESS_KEYWORDS,
    WARNING_KEYWORDS,
};

/// One step of the severity cascade.
pub struct SeverityRule {
    pub name: &'static str,
    pub evaluate: fn(&Signals) -> Option<Severity>,
}

/// Order matters! Structural evidence first, generic keywords after,
/// `default` last (always matches).
pub static SEVERITY_RULES: &[SeverityRule] = &[
    SeverityRule { name: "http_status", evaluate: http_status },
    SeverityRule { name: "stack_trace", evaluate: stack_trace },
    SeverityRule { name: "security", evaluate: security },
    SeverityRule { name: "database", evaluate: |s| s.database },
    SeverityRule { name: "system_error", evaluate: |s| s.system_error },
    SeverityRule { name: "business_logic", evaluate: |s| s.business },
    SeverityRule { name: "performance", evaluate: performance },
    SeverityRule { name: "error_keywords", evaluate: error_keywords },
    SeverityRule { name: "warning_keywords", evaluate: warning_keywords },
    SeverityRule { name: "success_keywords", evaluate: success_keywords },
    SeverityRule { name: "debug_keywords", evaluate: debug_keywords },
    SeverityRule { name: "resource_usage", evaluate: resource_usage },
    SeverityRule { name: "default", evaluate: |_| Some(Severity::Info) },
];

pub fn derive_severity(signals: &Signals) -> Severity {
    let (rule, severity) = first_match(signals);
    trace!(rule, severity = %severity, "severity derived");
    severity
}

/// Name of the winning rule alongside its answer.
pub fn first_match(signals: &Signals) -> (&'static str, Severity) {
    SEVERITY_RULES
        .iter()
        .find_map(|rule| (rule.evaluate)(signals).map(|severity| (rule.name, severity)))
        .unwrap_or(("default", Severity::Info))
}

pub fn status_severity(code: u16) -> Severity {
    HTTP_STATUS_SEVERITY
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, severity)| *severity)
        .unwrap_or_else(|| http_range_severity(code))
}

fn http_status(s: &Signals) -> Option<Severity> {
    s.http_status.map(status_severity)
}

fn stack_trace(s: &Signals) -> Option<Severity> {
    s.stack_trace.then_some(Severity::Error)
}

fn security(s: &Signals) -> Option<Severity> {
    s.security.then_some(Severity::Critical)
}

fn performance(s: &Signals) -> Option<Severity> {
    s.duration_ms.map(duration_severity)
}

fn error_keywords(s: &Signals) -> Option<Severity> {
    contains_any_keyword(&s.blob, ERROR_KEYWORDS).then_some(Severity::Error)
}

fn warning_keywords(s: &Signals) -> Option<Severity> {
    contains_any_keyword(&s.blob, WARNING_KEYWORDS).then_some(Severity::Warning)
}

fn success_keywords(s: &Signals) -> Option<Severity> {
    contains_any_keyword(&s.blob, SUCCESS_KEYWORDS).then_some(Severity::Success)
}

fn debug_keywords(s: &Signals) -> Option<Severity> {
    contains_any_keyword(&s.blob, DEBUG_KEYWORDS).then_some(Severity::Debug)
}

/// Highest cpu/memory/disk percentage decides.
fn resource_usage(s: &Signals) -> Option<Severity> {
    let peak = RESOURCE_CONTEXTS
        .iter()
        .filter_map(|ctx| extract_percentage(&s.blob, ctx))
        .max()?;

    if peak > RESOURCE_CRITICAL_PERCENT {
        Some(Severity::Critical)
    } else if peak > RESOURCE_WARNING_PERCENT {
        Some(Severity::Warning)
    } else {
        None
    }
}
