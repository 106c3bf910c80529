//! Persists generated tests upstream: one branch and one pull request per
//! polled batch, one commit per test file.

use std::path::{Component, Path};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use testsmith_models::{GenerationResult, PullRequest};
use tracing::info;

use crate::error::Result;
use crate::host::RemoteHost;

/// Pull request title.
pub const PR_TITLE: &str = "Automated Test Update";
/// Pull request body.
pub const PR_BODY: &str =
    "This PR was generated automatically to add/update unit tests for modified files.";

/// Branch and pull-request settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitterConfig {
    /// Branch the batch branches are cut from and merged into.
    pub main_branch: String,
    /// Prefix of batch branch names.
    pub branch_prefix: String,
}

impl CommitterConfig {
    pub fn new(main_branch: impl Into<String>, branch_prefix: impl Into<String>) -> Self {
        Self {
            main_branch: main_branch.into(),
            branch_prefix: branch_prefix.into(),
        }
    }
}

/// Commits generated test files to a remote branch and opens the PR.
pub struct RemoteCommitter {
    host: Arc<dyn RemoteHost>,
    config: CommitterConfig,
}

impl RemoteCommitter {
    pub fn new(host: Arc<dyn RemoteHost>, config: CommitterConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &CommitterConfig {
        &self.config
    }

    /// `{prefix}{yyyyMMddHHmmss}` in UTC.
    pub fn branch_name(&self, now: DateTime<Utc>) -> String {
        format!("{}{}", self.config.branch_prefix, now.format("%Y%m%d%H%M%S"))
    }

    /// Creates the batch branch off the main branch and returns its name.
    pub async fn begin_batch(&self) -> Result<String> {
        let branch = self.branch_name(Utc::now());
        self.host
            .create_branch(&branch, &self.config.main_branch)
            .await?;
        info!(branch = %branch, base = %self.config.main_branch, "Created batch branch");
        Ok(branch)
    }

    /// Commits one generated test file to `branch`.
    ///
    /// `source_path` is the changed file the tests were generated for; it only
    /// appears in the commit message.
    pub async fn commit(
        &self,
        branch: &str,
        source_path: &str,
        result: &GenerationResult,
    ) -> Result<String> {
        let path = repo_path(&result.test_path);
        let message = format!("Add/update test for {}", source_path);
        let sha = self
            .host
            .commit_file(branch, &path, &result.generated_code, &message)
            .await?;
        info!(branch, path = %path, sha = %sha, "Committed generated tests");
        Ok(sha)
    }

    /// Opens the batch pull request into the main branch.
    pub async fn open_pull_request(&self, branch: &str) -> Result<PullRequest> {
        let pr = self
            .host
            .create_pull_request(PR_TITLE, branch, &self.config.main_branch, PR_BODY)
            .await?;
        info!(number = pr.number, url = %pr.html_url, "Pull request created");
        Ok(pr)
    }
}

/// Repository-relative, `/`-separated form of a path.
pub fn repo_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
