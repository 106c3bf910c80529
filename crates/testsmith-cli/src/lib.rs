//! testsmith CLI library.
//!
//! Three modes share one orchestrator:
//! - `watch` - local auto mode, tests are written as soon as a file settles
//! - `poll` - remote mode, tests are committed back as a pull request
//! - `generate` - manual mode with a preview and an approve/reject prompt

pub mod cli;
pub mod commands;
pub mod error;

pub use error::{CommandError, Result};
