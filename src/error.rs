//! Error types for tablefile
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using TableError
pub type Result<T> = std::result::Result<T, TableError>;

/// Unified error type for tablefile operations
#[derive(Debug, Error)]
pub enum TableError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    /// Underlying stream failure. Propagated unchanged; no retry at this layer.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Format Errors
    // -------------------------------------------------------------------------
    /// File corruption: bad magic, checksum mismatch, truncated section,
    /// unknown codec tag. Not recoverable; callers should quarantine the file.
    #[error("format error: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // State Errors
    // -------------------------------------------------------------------------
    /// Programmer-contract violation: operation on a closed reader, or
    /// `entry()` while not positioned. Fails fast, never retried.
    #[error("state error: {0}")]
    State(&'static str),
}

impl TableError {
    /// Shorthand for a [`TableError::Format`] with a formatted message.
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        TableError::Format(msg.into())
    }
}
