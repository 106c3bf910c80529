//! Per-file test generation pipeline.
//!
//! The [`Orchestrator`] takes one [`ProcessingRequest`] and resolves it to
//! exactly one [`ProcessOutcome`]:
//!
//! ```text
//! request ──> skip-list? ──> interface? ──> public methods? ──> large file?
//!                 │              │                │                 │
//!              Skipped        Skipped          Skipped        localize region
//!                                                                   │
//!                                      backend ──> empty? ──> Skipped
//!                                         │
//!                       interactive? ── no ──> AutoFinalized
//!                            │
//!                           yes ──> AwaitingApproval ──> finalize | reject
//! ```
//!
//! # Example
//!
//! ```ignore
//! use testsmith_orchestrator::{Orchestrator, OrchestratorConfig};
//!
//! let orchestrator = Orchestrator::new(backend, OrchestratorConfig::default());
//! let outcome = orchestrator.process(&request).await;
//! if let Some(pending) = outcome.into_pending() {
//!     orchestrator.finalize(&pending).await?;
//! }
//! ```
//!
//! [`ProcessingRequest`]: testsmith_models::ProcessingRequest
//! [`ProcessOutcome`]: testsmith_models::ProcessOutcome

mod config;
mod error;
mod orchestrator;
pub mod prompt;

pub use config::OrchestratorConfig;
pub use error::{OrchestratorError, Result};
pub use orchestrator::{effective_line_count, Orchestrator};
