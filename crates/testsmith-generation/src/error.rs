//! Error types for generation clients.

use thiserror::Error;

/// Errors raised while talking to a generation provider.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
