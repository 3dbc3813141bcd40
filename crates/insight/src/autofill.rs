//! Validation and defaults for header fields the caller left empty.

use serde_json::Value;

use crate::model::{Body, DerivedMetadata, LogHeader, Severity, ValidationError};
use crate::palette::{is_valid_color, severity_color};
use crate::patterns::TYPE_FIELDS;

pub fn validate(header: &LogHeader) -> Result<(), ValidationError> {
    if header.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if !header.color.is_empty() && !is_valid_color(&header.color) {
        return Err(ValidationError::InvalidColor(header.color.clone()));
    }
    Ok(())
}

/// `type` for an entry that didn't name one: an explicit body
/// `type`/`level`/`severity` string, else the severity cascade's answer.
pub fn derive_type(body: &Body, severity: Severity) -> String {
    TYPE_FIELDS
        .iter()
        .find_map(|key| match body.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_lowercase()),
            _ => None,
        })
        .unwrap_or_else(|| severity.as_str().to_string())
}

/// Color from the derived severity; a free-form or body-supplied `type`
/// never changes it.
pub fn derive_color(derived: &DerivedMetadata) -> &'static str {
    severity_color(derived.severity)
}

/// Fill empty `type`, `source` and `color`. Supplied values are kept.
pub fn fill_defaults(header: &mut LogHeader, body: &Body, derived: &DerivedMetadata) {
    if header.log_type.trim().is_empty() {
        header.log_type = derive_type(body, derived.severity);
    }
    if header.source.trim().is_empty() {
        header.source = derived.source.clone();
    }
    if header.color.is_empty() {
        header.color = derive_color(derived).to_string();
    }
}
