//! Text-generation backends for testsmith.
//!
//! The orchestrator only sees [`GenerationBackend`]: a prompt goes in, the
//! cleaned-up test file comes out. Transport and provider failures are
//! logged here and surface as an empty string, which the orchestrator treats
//! as "nothing generated".

pub mod backend;
pub mod cleanup;
pub mod client;
pub mod error;

pub use backend::GenerationBackend;
pub use cleanup::clean_response;
pub use client::{GenerationConfig, HttpGenerationClient};
pub use error::{GenerationError, Result};
