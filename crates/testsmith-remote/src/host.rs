//! The remote host seam.

use async_trait::async_trait;
use testsmith_models::{CommitInfo, FileChange, PullRequest};

use crate::error::Result;

/// Git object API of a remote host.
///
/// Paths are repository-relative with `/` separators.
#[async_trait]
pub trait RemoteHost: Send + Sync {
    /// Head commit of `branch`.
    async fn latest_commit(&self, branch: &str) -> Result<CommitInfo>;

    /// File-level change list of the commit `sha`.
    async fn commit_file_diff(&self, sha: &str) -> Result<Vec<FileChange>>;

    /// Content of `path` at revision `sha`.
    ///
    /// Returns [`RemoteError::NotFound`](crate::RemoteError::NotFound) when the
    /// file does not exist at that revision.
    async fn file_content_at(&self, path: &str, sha: &str) -> Result<String>;

    /// Creates branch `name` pointing at the head of `from_branch`.
    async fn create_branch(&self, name: &str, from_branch: &str) -> Result<()>;

    /// Commits `content` to `path` on `branch`; returns the new commit SHA.
    async fn commit_file(&self, branch: &str, path: &str, content: &str, message: &str)
        -> Result<String>;

    /// Opens a pull request from `head` into `base`.
    async fn create_pull_request(
        &self,
        title: &str,
        head: &str,
        base: &str,
        body: &str,
    ) -> Result<PullRequest>;
}
