//! Error types for log storage

use std::io;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while writing log records
///
/// These never cross the [`LineAppender`](crate::LineAppender) boundary; the
/// appender reports them as warnings and swallows them so a broken log
/// destination cannot disturb the traffic being observed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
