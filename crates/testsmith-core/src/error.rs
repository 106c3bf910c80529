//! Error types for the core crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by configuration, parsing and path resolution.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required setting is missing.
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    /// No parser is registered for the extension.
    #[error("unsupported language: no parser registered for '{0}' files")]
    UnsupportedLanguage(String),

    /// The parser could not make sense of the source.
    #[error("failed to parse source: {0}")]
    Parse(String),

    /// A source file does not live under the configured source root.
    #[error("{} is not under source root {}", path.display(), root.display())]
    OutsideSourceRoot {
        /// The offending path.
        path: PathBuf,
        /// The source root it was resolved against.
        root: PathBuf,
    },

    /// A path has no usable file name.
    #[error("invalid file path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Reading a file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML.
    #[error("invalid settings file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
