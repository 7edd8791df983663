//! Error types for flatdb
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Unified error type for flatdb operations
#[derive(Debug, Error)]
pub enum DbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Metadata Errors
    // -------------------------------------------------------------------------
    #[error("metadata error: {0}")]
    Metadata(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("record {0} does not exist")]
    RecordNotFound(u64),

    #[error("record has {given} fields, schema defines {expected}")]
    FieldCount { given: usize, expected: usize },

    #[error("value for field `{field}` is {given} bytes, width is {width}")]
    FieldOverflow {
        field: String,
        given: usize,
        width: u16,
    },

    // -------------------------------------------------------------------------
    // Locking Errors
    // -------------------------------------------------------------------------
    #[error("lock cookie does not match for record {0}")]
    LockDenied(u64),

    // -------------------------------------------------------------------------
    // Mode Errors
    // -------------------------------------------------------------------------
    #[error("store is open read-only")]
    ReadOnly,
}
