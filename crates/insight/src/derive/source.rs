use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use super::signals::Signals;
use crate::model::{Body, LogHeader};
use crate::patterns::{SourceFamily, DATABASE_VENDORS, SOURCE_FAMILIES, SOURCE_FIELDS};

/// Source used when no strategy produced anything.
pub const FALLBACK_SOURCE: &str = "unknown";

pub struct SourceStrategy {
    pub name: &'static str,
    pub resolve: fn(&LogHeader, &Body, &Signals) -> Option<String>,
}

/// Order matters! Explicit fields before inference, the word scan last.
pub static SOURCE_STRATEGIES: &[SourceStrategy] = &[
    SourceStrategy { name: "body_field", resolve: |_, body, _| field_source(body) },
    SourceStrategy { name: "metadata_field", resolve: metadata_source },
    SourceStrategy { name: "header", resolve: header_source },
    SourceStrategy { name: "stack_language", resolve: |_, _, s| s.stack_language.map(String::from) },
    SourceStrategy { name: "content_family", resolve: |_, _, s| family_source(&s.blob) },
    SourceStrategy { name: "http", resolve: |_, _, s| s.http_status.map(|_| "web-service".to_string()) },
    SourceStrategy { name: "word_scan", resolve: |_, _, s| word_scan(&s.blob) },
];

lazy_static! {
    static ref FAMILY_PATTERNS: Vec<(Regex, Option<Regex>)> = SOURCE_FAMILIES
        .iter()
        .map(|family| (word_start(family.keywords), requirement(family)))
        .collect();
}

fn word_start(words: &[&str]) -> Regex {
    let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
    Regex::new(&format!(r"\b(?:{})", alternatives.join("|"))).expect("escaped alternation")
}

fn requirement(family: &SourceFamily) -> Option<Regex> {
    (!family.requires.is_empty()).then(|| word_start(family.requires))
}

pub fn derive_source(header: &LogHeader, body: &Body, signals: &Signals) -> String {
    SOURCE_STRATEGIES
        .iter()
        .find_map(|strategy| {
            (strategy.resolve)(header, body, signals).map(|source| {
                trace!(strategy = strategy.name, %source, "source derived");
                source
            })
        })
        .unwrap_or_else(|| FALLBACK_SOURCE.to_string())
}

/// First non-blank string among the well-known source keys.
fn field_source(map: &serde_json::Map<String, Value>) -> Option<String> {
    SOURCE_FIELDS.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

fn metadata_source(_: &LogHeader, body: &Body, _: &Signals) -> Option<String> {
    body.get("metadata")?.as_object().and_then(field_source)
}

fn header_source(header: &LogHeader, _: &Body, _: &Signals) -> Option<String> {
    let source = header.source.trim();
    (!source.is_empty()).then(|| source.to_string())
}

/// Service name for the first matching content family.
pub fn family_source(blob: &str) -> Option<String> {
    let (index, _) = FAMILY_PATTERNS.iter().enumerate().find(|(_, (keywords, requires))| {
        keywords.is_match(blob) && requires.as_ref().map_or(true, |r| r.is_match(blob))
    })?;

    let service = SOURCE_FAMILIES[index].service;
    if service == "database-service" {
        if let Some((_, vendor)) = DATABASE_VENDORS.iter().find(|(name, _)| blob.contains(name)) {
            return Some(vendor.to_string());
        }
    }
    Some(service.to_string())
}

/// Last-resort scan for tokens like `billing-service` or `mobile_app`.
///
/// A bare `service`/`app` or words merely containing them (`apparently`)
/// never qualify.
pub fn word_scan(blob: &str) -> Option<String> {
    blob.split(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .map(|token| token.trim_matches(|c: char| matches!(c, '-' | '_' | '.')))
        .find(|token| {
            let mut segments = token.rsplit(|c: char| matches!(c, '-' | '_' | '.'));
            let last = segments.next().unwrap_or_default();
            (last == "service" || last == "app") && segments.next().is_some() && token.len() > 2
        })
        .map(str::to_string)
}
