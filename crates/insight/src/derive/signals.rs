use crate::detect;
use crate::model::{Body, LogHeader, Severity};

/// Everything the structural detectors found in one entry.
///
/// Built once per entry so the severity, source and category cascades (and
/// analytics pattern counts) never re-scan the blob for the same family.
#[derive(Debug, Clone, PartialEq)]
pub struct Signals {
    /// Lower-case `"{type} {title} {description} {body}"`
    pub blob: String,
    pub http_status: Option<u16>,
    pub stack_trace: bool,
    pub stack_language: Option<&'static str>,
    pub security: bool,
    pub database: Option<Severity>,
    pub system_error: Option<Severity>,
    pub business: Option<Severity>,
    pub duration_ms: Option<f64>,
}

impl Signals {
    pub fn collect(header: &LogHeader, body: &Body) -> Self {
        Self::from_text(&blob(header, body))
    }

    pub fn from_text(text: &str) -> Self {
        let blob = text.to_lowercase();
        let stack_trace = detect::has_stack_trace(&blob);

        Self {
            http_status: detect::extract_http_status(&blob),
            stack_language: if stack_trace {
                detect::stack_trace_language(&blob)
            } else {
                None
            },
            stack_trace,
            security: detect::detect_security(&blob),
            database: detect::detect_database_issue(&blob),
            system_error: detect::detect_system_error(&blob),
            business: detect::detect_business_logic(&blob),
            duration_ms: detect::extract_performance(&blob),
            blob,
        }
    }

    pub fn has_performance(&self) -> bool {
        self.duration_ms.is_some()
    }
}

/// Searchable text for one entry. An empty body contributes nothing.
pub fn blob(header: &LogHeader, body: &Body) -> String {
    let mut text = format!("{} {} {}", header.log_type, header.title, header.description);
    if !body.is_empty() {
        text.push(' ');
        text.push_str(&serde_json::to_string(body).unwrap_or_default());
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: serde_json::Value) -> Body {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_blob_includes_every_header_text_field() {
        let header = LogHeader {
            log_type: "Deploy".into(),
            title: "Release".into(),
            description: "v2 rolled out".into(),
            ..LogHeader::default()
        };
        let text = blob(&header, &body(json!({"build": 42})));
        assert_eq!(text, r#"Deploy Release v2 rolled out {"build":42}"#);
    }

    #[test]
    fn test_blob_skips_empty_body() {
        let text = blob(&LogHeader::titled("hello"), &Body::new());
        assert!(!text.contains("{}"));
    }

    #[test]
    fn test_signals_are_lowercased_and_collected() {
        let header = LogHeader::titled("Upstream returned 502, took 1.2s");
        let signals = Signals::collect(&header, &Body::new());

        assert!(signals.blob.contains("upstream returned 502"));
        assert_eq!(signals.http_status, Some(502));
        assert_eq!(signals.duration_ms, Some(1200.0));
        assert!(!signals.stack_trace);
        assert!(!signals.security);
    }

    #[test]
    fn test_stack_language_only_with_stack_trace() {
        let trace = Signals::from_text("Exception in thread main\n\tat Foo.run(Foo.java:3)");
        assert!(trace.stack_trace);
        assert_eq!(trace.stack_language, Some("java-app"));

        let plain = Signals::from_text("rotated app.log");
        assert!(!plain.stack_trace);
        assert_eq!(plain.stack_language, None);
    }

    #[test]
    fn test_nested_body_values_are_searchable() {
        let header = LogHeader::titled("job");
        let signals = Signals::collect(
            &header,
            &body(json!({"details": {"db": {"msg": "Deadlock detected"}}})),
        );
        assert_eq!(signals.database, Some(Severity::Critical));
    }
}
