//! Error types for catalogue consolidation.

use thiserror::Error;

/// Errors that abort a consolidation run.
///
/// Per-object numerical degeneracies (non-positive flux, zero-extent
/// apertures, singular rotation matrices) are not errors; they are reported
/// through sentinel values on the affected record.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to grow {what} to {requested} entries")]
    Allocation {
        what: &'static str,
        requested: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    #[error("Object index {index} out of range for list of {len} objects")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
