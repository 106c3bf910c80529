//! Core data models for testsmith.
//!
//! This crate provides the types passed between the watch, poll and
//! orchestration layers: filesystem change events, processing requests,
//! pipeline outcomes, and the remote commit/diff records.

pub mod change;
pub mod outcome;
pub mod remote;
pub mod request;

// Re-export main types
pub use change::{ChangeEvent, ChangeKind, SettleSignal};
pub use outcome::{GenerationResult, ProcessOutcome, SkipReason};
pub use remote::{CommitInfo, FileChange, FileStatus, PullRequest, RemoteFileChange};
pub use request::{ProcessingRequest, ProjectRoots};
