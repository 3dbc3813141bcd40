//! Detectors: independent pure functions, one pattern family each.
//!
//! Every detector is case-insensitive and stateless. They never resolve
//! conflicts between each other; precedence is the deriver's job.

use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::Severity;
use crate::patterns::{
    BUSINESS_PHRASES, DATABASE_PHRASES, FILE_LINE_PATTERN, RESOURCE_CONTEXTS, SECURITY_PHRASES,
    STACK_TRACE_INDICATORS, STACK_TRACE_LANGUAGES, SYSTEM_ERROR_CODES,
};

lazy_static! {
    /// Tried in order; the first pattern that matches decides the code.
    static ref HTTP_STATUS_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(?:status|http|code)\s*[:=]?\s*([2-5]\d{2})\b").unwrap(),
        Regex::new(r#"(?i)\bhttp/\d(?:\.\d)?"?\s+([2-5]\d{2})\b"#).unwrap(),
        Regex::new(r"(?i)\breturned\s+(?:status\s+)?([2-5]\d{2})\b").unwrap(),
        Regex::new(r"(?i)\b([2-5]\d{2})\s+(?:error|ok|found|not found)\b").unwrap(),
        Regex::new(r#"(?i)"(?:status|status_code|statuscode|http_status|code)"\s*:\s*"?([2-5]\d{2})\b"#).unwrap(),
    ];

    static ref DURATION_PATTERN: Regex = Regex::new(
        r#"(?i)\b(?:took|duration|elapsed|latency|response time|execution time)["\s]*(?:of|in|:|=)?["\s]*(\d+(?:\.\d+)?)\s*(ms|milliseconds?|s|secs?|seconds?)\b"#
    ).unwrap();

    static ref DURATION_MS_FIELD: Regex = Regex::new(
        r#"(?i)"(?:duration|elapsed|latency|response_time|took)_ms"\s*:\s*(\d+(?:\.\d+)?)"#
    ).unwrap();

    static ref FILE_LINE: Regex = Regex::new(&format!("(?i){}", FILE_LINE_PATTERN)).unwrap();

    /// One compiled percentage pattern per resource context.
    static ref PERCENTAGE_PATTERNS: Vec<(&'static str, Regex)> = RESOURCE_CONTEXTS
        .iter()
        .map(|ctx| (*ctx, Regex::new(&percentage_pattern(ctx)).unwrap()))
        .collect();
}

fn percentage_pattern(context: &str) -> String {
    format!(
        r#"(?i)\b{}\w*(?:\s+usage)?(?:\s+(?:at|is|of|reached))?["\s]*[:=]?["\s]*(\d{{1,3}}(?:\.\d+)?)\s*%"#,
        regex::escape(context)
    )
}

/// Lower-case view of `text`, borrowing when it is already lower-case.
fn lowered(text: &str) -> Cow<'_, str> {
    if text.chars().any(char::is_uppercase) {
        Cow::Owned(text.to_lowercase())
    } else {
        Cow::Borrowed(text)
    }
}

fn first_phrase_match(text: &str, table: &[(&str, Severity)]) -> Option<Severity> {
    let text = lowered(text);
    table
        .iter()
        .find(|(phrase, _)| text.contains(phrase))
        .map(|(_, severity)| *severity)
}

/// Generic substring-OR test. `keywords` must be lower-case.
pub fn contains_any_keyword(text: &str, keywords: &[&str]) -> bool {
    let text = lowered(text);
    keywords.iter().any(|k| text.contains(k))
}

/// HTTP status code mentioned in `text` (200–599 only).
///
/// Patterns are tried in a fixed order: `status|http|code N`,
/// access-log `HTTP/1.1" N`, `returned N`, `N error|ok|found`, then
/// JSON-style `"status": N`.
pub fn extract_http_status(text: &str) -> Option<u16> {
    HTTP_STATUS_PATTERNS.iter().find_map(|re| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

pub fn has_stack_trace(text: &str) -> bool {
    contains_any_keyword(text, STACK_TRACE_INDICATORS) || FILE_LINE.is_match(text)
}

/// Language-tagged source name inferred from the first `file.ext:line` frame.
pub fn stack_trace_language(text: &str) -> Option<&'static str> {
    let caps = FILE_LINE.captures(text)?;
    let ext = caps.get(1)?.as_str().to_lowercase();
    STACK_TRACE_LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
}

pub fn detect_security(text: &str) -> bool {
    contains_any_keyword(text, SECURITY_PHRASES)
}

/// Duration in milliseconds from phrases like `took 250ms`, `elapsed: 1.5s`
/// or a `"duration_ms": 250` field.
pub fn extract_performance(text: &str) -> Option<f64> {
    if let Some(caps) = DURATION_PATTERN.captures(text) {
        let value: f64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = caps.get(2)?.as_str().to_lowercase();
        let ms = if unit.starts_with("ms") || unit.starts_with("milli") {
            value
        } else {
            value * 1000.0
        };
        return Some(ms);
    }

    DURATION_MS_FIELD
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// POSIX/network error code (`ECONNREFUSED`, `ENOSPC`...) anywhere in `text`.
pub fn detect_system_error(text: &str) -> Option<Severity> {
    let upper = if text.chars().any(char::is_lowercase) {
        Cow::Owned(text.to_uppercase())
    } else {
        Cow::Borrowed(text)
    };
    SYSTEM_ERROR_CODES
        .iter()
        .find(|(code, _)| upper.contains(code))
        .map(|(_, severity)| *severity)
}

pub fn detect_database_issue(text: &str) -> Option<Severity> {
    first_phrase_match(text, DATABASE_PHRASES)
}

pub fn detect_business_logic(text: &str) -> Option<Severity> {
    first_phrase_match(text, BUSINESS_PHRASES)
}

/// Integer percentage following `context`, e.g. `cpu: 95%` or
/// `memory usage at 80%`.
/// Contexts outside `RESOURCE_CONTEXTS` compile their pattern per call.
pub fn extract_percentage(text: &str, context: &str) -> Option<u32> {
    let compiled;
    let re = match PERCENTAGE_PATTERNS
        .iter()
        .find(|(ctx, _)| ctx.eq_ignore_ascii_case(context))
    {
        Some((_, re)) => re,
        None => {
            compiled = Regex::new(&percentage_pattern(context)).ok()?;
            &compiled
        }
    };
    let value: f64 = re.captures(text)?.get(1)?.as_str().parse().ok()?;
    Some(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{ERROR_KEYWORDS, SUCCESS_KEYWORDS};

    // ─────────────────────────────────────────────────────────
    // HTTP status
    // ─────────────────────────────────────────────────────────

    #[test]
    fn http_status_prefixed_forms() {
        assert_eq!(extract_http_status("request status 200"), Some(200));
        assert_eq!(extract_http_status("HTTP 404 for /missing"), Some(404));
        assert_eq!(extract_http_status("status: 403"), Some(403));
        assert_eq!(extract_http_status("code=502 upstream"), Some(502));
    }

    #[test]
    fn http_status_returned_and_suffix_forms() {
        assert_eq!(extract_http_status("upstream returned 500"), Some(500));
        assert_eq!(extract_http_status("GET /users 404 not found"), Some(404));
        assert_eq!(extract_http_status("health check 200 ok"), Some(200));
    }

    #[test]
    fn http_status_json_field() {
        assert_eq!(extract_http_status(r#"{"status": 503}"#), Some(503));
        assert_eq!(extract_http_status(r#"{"status_code":429}"#), Some(429));
    }

    #[test]
    fn http_status_access_log() {
        let line = r#"127.0.0.1 - - [29/Jan/2026:10:59:12 +0000] "GET /index.html HTTP/1.1" 200 4096"#;
        assert_eq!(extract_http_status(line), Some(200));
    }

    #[test]
    fn http_status_first_pattern_wins() {
        assert_eq!(extract_http_status("status 201, backend returned 500"), Some(201));
    }

    #[test]
    fn http_status_ignores_non_status_numbers() {
        assert_eq!(extract_http_status("processed 5000 rows"), None);
        assert_eq!(extract_http_status(r#"{"timeout":5000}"#), None);
        assert_eq!(extract_http_status(r#"{"error_code":"CONN_TIMEOUT"}"#), None);
        assert_eq!(extract_http_status("status 999"), None);
        assert_eq!(extract_http_status(""), None);
    }

    // ─────────────────────────────────────────────────────────
    // Stack traces
    // ─────────────────────────────────────────────────────────

    #[test]
    fn stack_trace_indicators() {
        assert!(has_stack_trace("Traceback (most recent call last):"));
        assert!(has_stack_trace("panic: runtime error: index out of range"));
        assert!(has_stack_trace("Caused by: java.io.IOException"));
        assert!(has_stack_trace("java.lang.NullPointerException\n    at com.example.App.main(App.java:42)"));
        assert!(has_stack_trace("thread 'main' panicked at src/main.rs:10:5"));
    }

    #[test]
    fn stack_trace_file_line_pattern() {
        assert!(has_stack_trace("handler failed in server.go:117"));
        assert!(has_stack_trace(r#"File "app.py", line 3, in <module>"#));
        assert!(has_stack_trace(r#"{"trace":"File \"app.py\", line 3"}"#));
    }

    #[test]
    fn stack_trace_negative() {
        assert!(!has_stack_trace("user logged in from browser"));
        assert!(!has_stack_trace("meeting at noon"));
        assert!(!has_stack_trace("connected to 127.0.0.1:8080"));
    }

    #[test]
    fn stack_trace_languages() {
        assert_eq!(stack_trace_language("at com.acme.Main.run(Main.java:12)"), Some("java-app"));
        assert_eq!(stack_trace_language(r#"File "worker.py", line 9"#), Some("python-app"));
        assert_eq!(stack_trace_language("at handler (/srv/index.js:20:3)"), Some("node-app"));
        assert_eq!(stack_trace_language("main.go:42 +0x1d"), Some("go-app"));
        assert_eq!(stack_trace_language("Traceback without frames"), None);
    }

    // ─────────────────────────────────────────────────────────
    // Phrase families
    // ─────────────────────────────────────────────────────────

    #[test]
    fn security_phrases() {
        assert!(detect_security("Possible SQL injection in search param"));
        assert!(detect_security("brute force attempt from 10.0.0.9"));
        assert!(!detect_security("User authentication successful"));
    }

    #[test]
    fn system_error_codes_case_insensitive() {
        assert_eq!(detect_system_error("connect ECONNREFUSED 127.0.0.1:5432"), Some(Severity::Error));
        assert_eq!(detect_system_error("write failed: enospc"), Some(Severity::Critical));
        assert_eq!(detect_system_error("open config.yml: ENOENT"), Some(Severity::Warning));
        assert_eq!(detect_system_error("all good"), None);
    }

    #[test]
    fn system_error_most_severe_listed_first() {
        assert_eq!(
            detect_system_error("ECONNRESET followed by ENOMEM"),
            Some(Severity::Critical)
        );
    }

    #[test]
    fn database_phrases() {
        assert_eq!(detect_database_issue("Deadlock detected on table orders"), Some(Severity::Critical));
        assert_eq!(detect_database_issue("foreign key violation on user_id"), Some(Severity::Error));
        assert_eq!(detect_database_issue("duplicate key value violates index"), Some(Severity::Warning));
        assert_eq!(detect_database_issue("select ran fine"), None);
    }

    #[test]
    fn business_phrases() {
        assert_eq!(detect_business_logic("Payment failed for order 9"), Some(Severity::Error));
        assert_eq!(detect_business_logic("payment successful"), Some(Severity::Success));
        assert_eq!(detect_business_logic("Login failed for bob"), Some(Severity::Warning));
        assert_eq!(detect_business_logic("nothing commercial"), None);
    }

    // ─────────────────────────────────────────────────────────
    // Performance & resources
    // ─────────────────────────────────────────────────────────

    #[test]
    fn performance_milliseconds_and_seconds() {
        assert_eq!(extract_performance("query took 250ms"), Some(250.0));
        assert_eq!(extract_performance("Request took 2.5s"), Some(2500.0));
        assert_eq!(extract_performance("elapsed: 40 ms"), Some(40.0));
        assert_eq!(extract_performance("duration = 3 seconds"), Some(3000.0));
    }

    #[test]
    fn performance_json_forms() {
        assert_eq!(extract_performance(r#"{"duration":"120ms"}"#), Some(120.0));
        assert_eq!(extract_performance(r#"{"duration_ms":875}"#), Some(875.0));
    }

    #[test]
    fn performance_absent() {
        assert_eq!(extract_performance("Query took longer than expected"), None);
        assert_eq!(extract_performance(""), None);
    }

    #[test]
    fn percentage_with_context() {
        assert_eq!(extract_percentage("cpu: 95%", "cpu"), Some(95));
        assert_eq!(extract_percentage("Memory usage at 80%", "memory"), Some(80));
        assert_eq!(extract_percentage(r#"{"disk":"91.5%"}"#, "disk"), Some(91));
        assert_eq!(extract_percentage("cpu fine", "cpu"), None);
        assert_eq!(extract_percentage("memory: 50%", "cpu"), None);
    }

    #[test]
    fn test_percentage_patterns_cached_per_resource() {
        let cached: Vec<&str> = PERCENTAGE_PATTERNS.iter().map(|(ctx, _)| *ctx).collect();
        assert_eq!(cached, RESOURCE_CONTEXTS);
        assert_eq!(extract_percentage("DISK: 77%", "Disk"), Some(77));
        // uncached contexts still work
        assert_eq!(extract_percentage("swap: 64%", "swap"), Some(64));
    }

    // ─────────────────────────────────────────────────────────
    // Keywords
    // ─────────────────────────────────────────────────────────

    #[test]
    fn keyword_detection_is_case_insensitive() {
        assert!(contains_any_keyword("Operation FAILED", ERROR_KEYWORDS));
        assert!(contains_any_keyword("completed successfully", SUCCESS_KEYWORDS));
        assert!(!contains_any_keyword("user logged in from browser", ERROR_KEYWORDS));
    }

    #[test]
    fn empty_text_matches_nothing() {
        assert!(!contains_any_keyword("", ERROR_KEYWORDS));
        assert!(!has_stack_trace(""));
        assert!(!detect_security(""));
        assert_eq!(detect_system_error(""), None);
        assert_eq!(detect_database_issue(""), None);
        assert_eq!(detect_business_logic(""), None);
    }
}
