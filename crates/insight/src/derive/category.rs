use lazy_static::lazy_static;
use regex::Regex;

use super::signals::Signals;
use crate::model::LogHeader;
use crate::patterns::{BUSINESS_CATEGORY_TERMS, CATEGORY_STOPWORDS};

pub const FALLBACK_CATEGORY: &str = "general";

pub struct CategoryRule {
    pub name: &'static str,
    pub resolve: fn(&LogHeader, &Signals) -> Option<String>,
}

/// Order matters! The caller's own type always wins.
pub static CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule { name: "header_type", resolve: header_type },
    CategoryRule { name: "security", resolve: |_, s| s.security.then(|| "security".to_string()) },
    CategoryRule { name: "database", resolve: |_, s| s.database.map(|_| "database".to_string()) },
    CategoryRule { name: "business", resolve: business },
    CategoryRule { name: "http", resolve: |_, s| s.http_status.map(|_| "http".to_string()) },
    CategoryRule { name: "exception", resolve: |_, s| s.stack_trace.then(|| "exception".to_string()) },
    CategoryRule { name: "performance", resolve: performance },
    CategoryRule { name: "title_word", resolve: title_word },
];

lazy_static! {
    static ref BUSINESS_TERMS: Regex =
        Regex::new(&format!(r"\b(?:{})", BUSINESS_CATEGORY_TERMS.join("|"))).unwrap();
}

pub fn derive_category(header: &LogHeader, signals: &Signals) -> String {
    CATEGORY_RULES
        .iter()
        .find_map(|rule| (rule.resolve)(header, signals))
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}

fn header_type(header: &LogHeader, _: &Signals) -> Option<String> {
    let log_type = header.log_type.trim();
    (!log_type.is_empty()).then(|| log_type.to_lowercase())
}

fn business(_: &LogHeader, s: &Signals) -> Option<String> {
    BUSINESS_TERMS.is_match(&s.blob).then(|| "business".to_string())
}

fn performance(_: &LogHeader, s: &Signals) -> Option<String> {
    s.duration_ms
        .filter(|ms| *ms > 0.0)
        .map(|_| "performance".to_string())
}

/// First title word longer than two characters that isn't a stopword,
/// else the first word at all.
fn title_word(header: &LogHeader, _: &Signals) -> Option<String> {
    let words: Vec<String> = header
        .title
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    words
        .iter()
        .find(|w| w.chars().count() > 2 && !CATEGORY_STOPWORDS.contains(&w.as_str()))
        .or_else(|| words.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category_of(title: &str) -> String {
        let header = LogHeader::titled(title);
        derive_category(&header, &Signals::collect(&header, &Default::default()))
    }

    #[test]
    fn test_header_type_wins_lowercased() {
        let header = LogHeader {
            log_type: "Deployment".into(),
            title: "sql injection attempt".into(),
            ..LogHeader::default()
        };
        let signals = Signals::collect(&header, &Default::default());
        assert_eq!(derive_category(&header, &signals), "deployment");
    }

    #[test]
    fn test_structural_categories_in_order() {
        assert_eq!(category_of("brute force on login with deadlock"), "security");
        assert_eq!(category_of("deadlock while charging invoice"), "database");
        assert_eq!(category_of("invoice 42 status 500"), "business");
        assert_eq!(category_of("GET /health status 200"), "http");
        assert_eq!(category_of("Traceback (most recent call last):"), "exception");
        assert_eq!(category_of("nightly export took 3s"), "performance");
    }

    #[test]
    fn test_zero_duration_is_not_performance() {
        assert_eq!(category_of("cache warm took 0ms"), "cache");
    }

    #[test]
    fn test_title_word_skips_short_words_and_stopwords() {
        assert_eq!(category_of("The scheduler woke up"), "scheduler");
        assert_eq!(category_of("an ok go"), "an");
        assert_eq!(category_of("Backup: nightly"), "backup");
    }

    #[test]
    fn test_empty_title_falls_back_to_general() {
        assert_eq!(category_of(""), FALLBACK_CATEGORY);
        assert_eq!(category_of("  ... "), FALLBACK_CATEGORY);
    }
}
