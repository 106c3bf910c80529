//! Persistence error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from file persistence.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Failed to create a directory.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("failed to read {}: {source}", path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
