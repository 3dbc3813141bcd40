use serde::Serialize;

use crate::autofill::{fill_defaults, validate};
use crate::derive::derive_metadata;
use crate::model::{Body, DerivedMetadata, LogEntry, LogHeader, ValidationError};

/// A validated entry with filled header and its derived metadata, ready to
/// be persisted. `id` and `timestamp` are assigned by storage.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedLog {
    pub header: LogHeader,
    pub body: Body,
    pub derived: DerivedMetadata,
}

/// validate → derive → fill.
///
/// Derivation sees the header exactly as supplied, so filled defaults never
/// feed back into severity/source/category.
pub fn prepare(entry: LogEntry) -> Result<PreparedLog, ValidationError> {
    let LogEntry { mut header, body } = entry;
    validate(&header)?;

    let derived = derive_metadata(&header, &body);
    fill_defaults(&mut header, &body, &derived);

    Ok(PreparedLog {
        header,
        body,
        derived,
    })
}
