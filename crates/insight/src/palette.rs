use crate::model::Severity;

/// Tailwind CSS 4 color names accepted in `header.color`.
pub const VALID_COLORS: [&str; 22] = [
    "slate", "gray", "zinc", "neutral", "stone", "red", "orange", "amber", "yellow", "lime",
    "green", "emerald", "teal", "cyan", "sky", "blue", "indigo", "violet", "purple", "fuchsia",
    "pink", "rose",
];

/// Color used when nothing more specific applies.
pub const DEFAULT_COLOR: &str = "blue";

/// Case-sensitive membership test.
pub fn is_valid_color(color: &str) -> bool {
    VALID_COLORS.contains(&color)
}

pub fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => "red",
        Severity::Error => "rose",
        Severity::Warning => "yellow",
        Severity::Success => "green",
        Severity::Debug => "gray",
        Severity::Info => DEFAULT_COLOR,
    }
}
