// Metadata derivation engine for CubicLog.

// Data & tables
pub mod model;
pub mod patterns;
pub mod palette;

// Classification
pub mod detect;
pub mod derive;
pub mod autofill;
pub mod ingest;

// Reporting
pub mod analytics;

pub use analytics::{aggregate, AggregateStats};
pub use derive::derive_metadata;
pub use ingest::{prepare, PreparedLog};
pub use model::{Body, DerivedMetadata, LogEntry, LogHeader, Severity, StoredLog, ValidationError};
