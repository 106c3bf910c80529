//! Error types for the orchestrator.

use std::path::PathBuf;

use thiserror::Error;

/// Faults inside one file's pipeline.
///
/// [`Orchestrator::process`](crate::Orchestrator::process) never returns
/// these; they are converted to a skip outcome at its boundary.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Parsing, path or configuration error.
    #[error(transparent)]
    Core(#[from] testsmith_core::CoreError),

    /// Writing the preview or test file failed.
    #[error(transparent)]
    Persistence(#[from] testsmith_persistence::PersistenceError),

    /// The source file could not be read.
    #[error("failed to read source {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
