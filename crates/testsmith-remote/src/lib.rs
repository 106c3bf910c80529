//! Remote VCS host access for testsmith's polling mode.
//!
//! - [`RemoteHost`]: the object API the poller and committer need
//! - [`GitHubClient`]: GitHub REST v3 implementation
//! - [`RemoteCommitter`]: branch per batch, one commit per test file, one PR

pub mod committer;
pub mod error;
pub mod github;
pub mod host;

pub use committer::{CommitterConfig, RemoteCommitter};
pub use error::{RemoteError, Result};
pub use github::{GitHubClient, RepositoryId};
pub use host::RemoteHost;
