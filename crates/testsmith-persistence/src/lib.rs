//! Persistence layer for testsmith.
//!
//! Generated test files are written with atomic file operations (write to a
//! temp file in the destination directory, then rename), so a crash never
//! leaves a half-written test file behind. Writes to the same destination are
//! serialized through [`PathLocks`].
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use testsmith_persistence::atomic::atomic_write_str;
//!
//! atomic_write_str(Path::new("tests/a/FooTests.cs"), "public class FooTests {}").unwrap();
//! ```

pub mod atomic;
pub mod error;
pub mod locks;

pub use error::{PersistenceError, Result};
pub use locks::PathLocks;
