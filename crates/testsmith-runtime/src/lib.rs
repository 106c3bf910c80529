//! Change detection runtime for testsmith.
//!
//! Two triggers feed the shared [`Orchestrator`](testsmith_orchestrator::Orchestrator):
//! - `LocalWatcher` + `DebounceEngine` - filesystem notifications collapsed
//!   into one settle signal per quiet path
//! - `RemotePoller` - polls a remote branch, diffs each new commit and
//!   commits the generated tests back as one pull request per batch
//!
//! `WatchRuntime` wires the local pieces together and owns their shutdown.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use testsmith_models::ProjectRoots;
//! use testsmith_runtime::{RuntimeConfig, WatchRuntime};
//!
//! let roots = ProjectRoots::new("/work/app", "src", "tests");
//! let mut runtime = WatchRuntime::new(roots, Arc::new(orchestrator), RuntimeConfig::default());
//! runtime.start().await?;
//! tokio::signal::ctrl_c().await?;
//! runtime.shutdown().await?;
//! ```

pub mod config;
pub mod debounce;
pub mod error;
pub mod poller;
pub mod runtime;
pub mod watcher;

pub use config::RuntimeConfig;
pub use debounce::DebounceEngine;
pub use error::{Result, RuntimeError};
pub use poller::{PollOutcome, RemotePoller};
pub use runtime::WatchRuntime;
pub use watcher::{ExtensionFilter, LocalWatcher};
