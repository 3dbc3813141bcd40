//! Metadata deriver: severity, source and category for one entry.
//!
//! Each answer comes from an ordered rule table evaluated over the same
//! [`Signals`]; the first rule that produces something wins. Derivation is
//! total and deterministic, it never fails and never looks at the clock.

mod category;
mod severity;
mod signals;
mod source;

pub use category::{derive_category, CategoryRule, CATEGORY_RULES, FALLBACK_CATEGORY};
pub use severity::{derive_severity, first_match, status_severity, SeverityRule, SEVERITY_RULES};
pub use signals::{blob, Signals};
pub use source::{derive_source, family_source, word_scan, SourceStrategy, FALLBACK_SOURCE, SOURCE_STRATEGIES};

use tracing::debug;

use crate::model::{Body, DerivedMetadata, LogHeader};

pub fn derive_metadata(header: &LogHeader, body: &Body) -> DerivedMetadata {
    let signals = Signals::collect(header, body);
    let derived = DerivedMetadata {
        severity: derive_severity(&signals),
        source: derive_source(header, body, &signals),
        category: derive_category(header, &signals),
    };

    debug!(
        severity = %derived.severity,
        source = %derived.source,
        category = %derived.category,
        "metadata derived"
    );
    derived
}
