//! Error types for the runtime crate.

use thiserror::Error;

/// Errors that can occur in the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Runtime not started.
    #[error("runtime not started")]
    NotStarted,

    /// Runtime already started.
    #[error("runtime already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),

    /// Filesystem watch could not be established.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Remote host error.
    #[error(transparent)]
    Remote(#[from] testsmith_remote::RemoteError),

    /// Core error (path derivation, configuration).
    #[error(transparent)]
    Core(#[from] testsmith_core::CoreError),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
