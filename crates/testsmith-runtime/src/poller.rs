//! Remote branch poller.
//!
//! Each iteration compares the head of the tracked branch with the last
//! commit seen, diffs a new commit down to the relevant source files, runs
//! the orchestrator on each of them and commits the results to one batch
//! branch with one pull request.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use testsmith_core::{test_path_for, SkipList};
use testsmith_models::{
    CommitInfo, FileChange, FileStatus, GenerationResult, ProcessOutcome, ProcessingRequest,
    ProjectRoots, PullRequest, RemoteFileChange,
};
use testsmith_orchestrator::Orchestrator;
use testsmith_remote::committer::repo_path;
use testsmith_remote::{CommitterConfig, RemoteCommitter, RemoteHost};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::error::Result;

/// What one poll iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// First commit observed; remembered without dispatch.
    Primed { sha: String },
    /// Head has not moved since the last poll.
    NoNewCommit,
    /// New commit without relevant source files.
    NoRelevantFiles { sha: String },
    /// Relevant files were processed. `branch` is the batch branch, created
    /// only when a result was ready to commit.
    Dispatched {
        branch: Option<String>,
        committed: usize,
        pull_request: Option<PullRequest>,
    },
    /// Cancellation was requested before dispatch started.
    Cancelled,
}

/// Polls a remote branch and turns each new commit into a test update PR.
pub struct RemotePoller {
    host: Arc<dyn RemoteHost>,
    orchestrator: Arc<Orchestrator>,
    committer: RemoteCommitter,
    skip_list: SkipList,
    roots: ProjectRoots,
    config: RuntimeConfig,
    last_seen: Option<String>,
}

impl RemotePoller {
    /// Creates a poller.
    ///
    /// `roots.project` is the project folder inside the repository (empty for
    /// the repository root).
    pub fn new(
        host: Arc<dyn RemoteHost>,
        orchestrator: Arc<Orchestrator>,
        committer_config: CommitterConfig,
        skip_list: SkipList,
        roots: ProjectRoots,
        config: RuntimeConfig,
    ) -> Self {
        let committer = RemoteCommitter::new(Arc::clone(&host), committer_config);
        Self {
            host,
            orchestrator,
            committer,
            skip_list,
            roots,
            config,
            last_seen: None,
        }
    }

    /// The last commit SHA observed, if any.
    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    /// Runs poll iterations until `cancel` fires.
    ///
    /// Iterations never overlap: the next poll starts only after the
    /// previous dispatch has completed and the poll interval has elapsed.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            branch = %self.committer.config().main_branch,
            interval_secs = self.config.poll_interval.as_secs(),
            "Remote poller started"
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.poll_once(&cancel).await {
                Ok(outcome) => debug!(?outcome, "Poll completed"),
                Err(e) => warn!(error = %e, "Poll failed"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("Remote poller stopped");
    }

    /// Runs one poll iteration.
    pub async fn poll_once(&mut self, cancel: &CancellationToken) -> Result<PollOutcome> {
        let main_branch = self.committer.config().main_branch.clone();
        let commit = tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            commit = self.host.latest_commit(&main_branch) => commit?,
        };

        match self.last_seen.as_deref() {
            None => {
                info!(sha = %commit.sha, "Primed with latest commit");
                self.last_seen = Some(commit.sha.clone());
                return Ok(PollOutcome::Primed { sha: commit.sha });
            }
            Some(seen) if seen == commit.sha => {
                debug!(sha = %commit.sha, "No new commit");
                return Ok(PollOutcome::NoNewCommit);
            }
            Some(_) => {}
        }

        info!(sha = %commit.sha, "New commit detected");
        self.last_seen = Some(commit.sha.clone());

        let changes = tokio::select! {
            _ = cancel.cancelled() => return Ok(PollOutcome::Cancelled),
            changes = self.relevant_changes(&commit) => changes?,
        };
        if changes.is_empty() {
            info!(sha = %commit.sha, "No relevant files in commit");
            return Ok(PollOutcome::NoRelevantFiles { sha: commit.sha });
        }
        if cancel.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        self.dispatch(&commit, changes, cancel).await
    }

    /// Processes each change in sequence. The batch branch is created just
    /// before the first commit, so a batch that produces nothing leaves no
    /// branch behind.
    async fn dispatch(
        &self,
        commit: &CommitInfo,
        changes: Vec<RemoteFileChange>,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome> {
        let mut branch: Option<String> = None;
        let mut committed = 0;

        for change in &changes {
            if cancel.is_cancelled() {
                info!(branch = ?branch, "Cancellation requested, stopping batch");
                break;
            }
            let result = match self.process_change(commit, change).await {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %change.path, error = %e, "Failed to process remote change");
                    continue;
                }
            };

            let name = match branch.take() {
                Some(name) => name,
                None => self.committer.begin_batch().await?,
            };
            match self.committer.commit(&name, &change.path, &result).await {
                Ok(_) => committed += 1,
                Err(e) => warn!(path = %change.path, error = %e, "Failed to commit generated tests"),
            }
            branch = Some(name);
        }

        let pull_request = match &branch {
            Some(name) if committed > 0 => Some(self.committer.open_pull_request(name).await?),
            _ => {
                info!(sha = %commit.sha, "Nothing committed, no pull request opened");
                None
            }
        };

        Ok(PollOutcome::Dispatched {
            branch,
            committed,
            pull_request,
        })
    }

    /// Runs the orchestrator for one file.
    ///
    /// Returns the generated result when there is something to commit.
    async fn process_change(
        &self,
        commit: &CommitInfo,
        change: &RemoteFileChange,
    ) -> Result<Option<GenerationResult>> {
        if change.new_content.trim().is_empty() {
            info!(path = %change.path, "File deleted or empty at commit, skipping");
            return Ok(None);
        }

        let file_path = PathBuf::from(&change.path);
        let test_path = test_path_for(&self.roots, &file_path)?;
        let existing_tests = self.content_or_empty(&repo_path(&test_path), &commit.sha).await;

        let request = ProcessingRequest::new(file_path, self.roots.clone())
            .with_contents(change.old_content.clone(), change.new_content.clone())
            .with_sample_reference(self.config.sample_reference.clone())
            .with_existing_tests(existing_tests)
            .interactive(true);

        match self.orchestrator.process(&request).await {
            ProcessOutcome::AwaitingApproval(result) => Ok(Some(result)),
            ProcessOutcome::AutoFinalized { test_path } => {
                warn!(test_path = %test_path.display(), "Remote change finalized locally");
                Ok(None)
            }
            ProcessOutcome::Skipped(reason) => {
                debug!(path = %change.path, reason = %reason, "Remote change skipped");
                Ok(None)
            }
        }
    }

    /// Lists the commit's relevant files with content on both sides.
    async fn relevant_changes(&self, commit: &CommitInfo) -> Result<Vec<RemoteFileChange>> {
        let files = self.host.commit_file_diff(&commit.sha).await?;
        let mut changes = Vec::new();

        for file in files.iter().filter(|f| self.is_relevant(f)) {
            let old_content = match commit.first_parent() {
                Some(parent) => self.content_or_empty(&file.path, parent).await,
                None => String::new(),
            };
            let new_content = self.content_or_empty(&file.path, &commit.sha).await;
            changes.push(RemoteFileChange {
                path: file.path.clone(),
                old_content,
                new_content,
            });
        }

        debug!(sha = %commit.sha, total = files.len(), relevant = changes.len(), "Commit diffed");
        Ok(changes)
    }

    fn is_relevant(&self, file: &FileChange) -> bool {
        let path = Path::new(&file.path);
        file.status != FileStatus::Removed
            && has_extension(&file.path, &self.config.extension)
            && !self.skip_list.should_skip(path)
            && !self.roots.is_test_path(path)
    }

    /// Content of `path` at `sha`; any failure reads as empty.
    async fn content_or_empty(&self, path: &str, sha: &str) -> String {
        match self.host.file_content_at(path, sha).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                debug!(path, sha, "File not present at revision");
                String::new()
            }
            Err(e) => {
                warn!(path, sha, error = %e, "Failed to fetch file content");
                String::new()
            }
        }
    }
}

fn has_extension(path: &str, extension: &str) -> bool {
    path.to_lowercase().ends_with(&extension.to_lowercase())
}
