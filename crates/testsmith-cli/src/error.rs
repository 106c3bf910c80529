//! Error types for CLI commands.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by a CLI command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Core(#[from] testsmith_core::CoreError),

    #[error(transparent)]
    Orchestrator(#[from] testsmith_orchestrator::OrchestratorError),

    #[error(transparent)]
    Generation(#[from] testsmith_generation::GenerationError),

    #[error(transparent)]
    Remote(#[from] testsmith_remote::RemoteError),

    #[error(transparent)]
    Runtime(#[from] testsmith_runtime::RuntimeError),

    #[error("input error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A path given on the command line does not exist or is unusable.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, CommandError>;
