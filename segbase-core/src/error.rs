// segbase-core/src/error.rs

use thiserror::Error;

/// Errors surfaced by the store.
///
/// Absence of a document is never an error: point lookups return `Option`,
/// deletes return `bool`/counts. A missing segment file on read is an empty
/// segment, not a failure.
#[derive(Error, Debug)]
pub enum SegBaseError {
    /// Filesystem failure other than file-absent-on-read. Propagated
    /// unchanged; no retry, no silent recovery.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A segment file could not be parsed, or a record map could not be
    /// encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The id allocator spent its retry budget without producing a
    /// collision-free id.
    #[error("id allocation exhausted for collection '{collection}' after {attempts} attempts")]
    IdExhausted { collection: String, attempts: u32 },

    /// A value that must be a JSON object was something else.
    #[error("invalid document: {0}")]
    InvalidDocument(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SegBaseError>;
