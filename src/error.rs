//! Error taxonomy for the filter engine.
//!
//! None of these conditions is fatal to the surrounding view. The controller
//! logs and swallows storage and address failures, and reports the rest to
//! the caller as no-op failures with state left untouched.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    /// A value's kind disagrees with the definition that owns the field.
    #[error("type mismatch for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A filter id, name or field that the catalog does not know about.
    #[error("unknown filter reference: {0}")]
    UnknownFilterReference(String),

    #[error("malformed persisted record: {0}")]
    MalformedPersistedRecord(String),

    /// A record lacks the field a filter targets.
    #[error("record has no field '{0}'")]
    MissingUpstreamField(String),

    #[error("invalid filter catalog: {0}")]
    InvalidCatalog(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("address rewrite failed: {0}")]
    Address(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FilterError>;
