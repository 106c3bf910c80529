//! Remote host error types.

use thiserror::Error;

/// Errors from the remote VCS host.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The requested object does not exist at that revision.
    #[error("not found: {0}")]
    NotFound(String),

    /// The host rejected the request.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The repository URL could not be understood.
    #[error("invalid repository URL: {0}")]
    InvalidRepository(String),

    /// File content could not be decoded.
    #[error("failed to decode content: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
