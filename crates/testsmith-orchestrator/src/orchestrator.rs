//! The per-file processing state machine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use testsmith_core::localizer::{localize, ChangeSet};
use testsmith_core::test_path_for;
use testsmith_generation::GenerationBackend;
use testsmith_models::{GenerationResult, ProcessOutcome, ProcessingRequest, SkipReason};
use testsmith_persistence::atomic::{atomic_write_str, read_or_empty};
use testsmith_persistence::PathLocks;
use tracing::{debug, error, info};

use crate::config::OrchestratorConfig;
use crate::error::{OrchestratorError, Result};
use crate::prompt::build_prompt;

/// Suffix added to the test file stem for preview files.
const PREVIEW_SUFFIX: &str = "_temp";

/// Drives one changed file from request to outcome.
///
/// Shared by every trigger (local watcher, remote poller, manual CLI); the
/// only difference between them is the request's `interactive` flag.
pub struct Orchestrator {
    backend: Arc<dyn GenerationBackend>,
    config: OrchestratorConfig,
    locks: PathLocks,
}

impl Orchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: OrchestratorConfig) -> Self {
        Self {
            backend,
            config,
            locks: PathLocks::new(),
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Processes one request to its terminal outcome.
    ///
    /// Never fails: unexpected faults are logged and reported as
    /// `Skipped(Failed(..))`.
    pub async fn process(&self, request: &ProcessingRequest) -> ProcessOutcome {
        match self.try_process(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(path = %request.file_path.display(), error = %e, "Processing failed");
                ProcessOutcome::Skipped(SkipReason::Failed(e.to_string()))
            }
        }
    }

    async fn try_process(&self, request: &ProcessingRequest) -> Result<ProcessOutcome> {
        let path = &request.file_path;

        if self.config.skip_list.should_skip(path) {
            return Ok(skipped(path, SkipReason::SkipListed));
        }

        let parser = self.config.parsers.for_extension(&request.extension)?;
        let source = if request.new_content.trim().is_empty() {
            std::fs::read_to_string(path).map_err(|source| OrchestratorError::SourceRead {
                path: path.clone(),
                source,
            })?
        } else {
            request.new_content.clone()
        };

        if parser.declares_interface(&source) {
            return Ok(skipped(path, SkipReason::InterfaceOnly));
        }

        let tree = parser.parse(&source)?;
        if parser.public_method_names(&tree).is_empty() {
            return Ok(skipped(path, SkipReason::NoPublicMethods));
        }

        let line_count = effective_line_count(&source);
        let payload = if line_count > self.config.line_threshold && request.has_both_contents() {
            let change = ChangeSet::new(request.old_content.as_str(), source.as_str());
            match localize(&change, parser.as_ref())? {
                Some(region) => {
                    info!(
                        path = %path.display(),
                        lines = line_count,
                        methods = ?region.method_names,
                        "Large file, sending affected region only"
                    );
                    region.render()
                }
                None => return Ok(skipped(path, SkipReason::NoAffectedMethods)),
            }
        } else {
            source
        };

        let test_path = test_path_for(&request.roots, path)?;
        let existing_tests = match &request.existing_test_content {
            Some(content) => content.clone(),
            None => read_or_empty(&test_path)?,
        };

        let prompt = build_prompt(
            &self.config.prompt_template,
            &request.sample_reference,
            &payload,
            &existing_tests,
        );
        debug!(path = %path.display(), prompt_chars = prompt.len(), "Requesting generation");

        let generated = self.backend.generate(&prompt).await;
        if generated.trim().is_empty() {
            return Ok(skipped(path, SkipReason::EmptyResponse));
        }

        let preview_path = if self.config.preview {
            Some(self.write_preview(&test_path, &generated)?)
        } else {
            None
        };

        let result = GenerationResult {
            preview_path,
            test_path,
            generated_code: generated,
        };

        if request.interactive {
            info!(
                path = %path.display(),
                test_path = %result.test_path.display(),
                "Generated tests awaiting approval"
            );
            return Ok(ProcessOutcome::AwaitingApproval(result));
        }

        self.finalize(&result).await?;
        Ok(ProcessOutcome::AutoFinalized {
            test_path: result.test_path,
        })
    }

    /// Writes the generated code to its destination, replacing any content.
    ///
    /// Finalizes for the same destination never interleave.
    pub async fn finalize(&self, result: &GenerationResult) -> Result<()> {
        let _guard = self.locks.lock(&result.test_path).await;
        atomic_write_str(&result.test_path, &result.generated_code)?;
        info!(test_path = %result.test_path.display(), "Test file updated");
        Ok(())
    }

    /// Discards a pending result. Nothing is written; a preview file, if
    /// any, is left where it is.
    pub fn reject(&self, result: &GenerationResult) {
        info!(
            test_path = %result.test_path.display(),
            preview = ?result.preview_path,
            "Generated tests rejected"
        );
    }

    fn write_preview(&self, test_path: &Path, code: &str) -> Result<PathBuf> {
        let preview_path = preview_path_for(&self.config.preview_dir, test_path);
        atomic_write_str(&preview_path, code)?;
        info!(preview = %preview_path.display(), "Preview written, open it to review");
        Ok(preview_path)
    }
}

/// `{dir}/{Stem}_temp{ext}` for a test file `{Stem}{ext}`.
fn preview_path_for(dir: &Path, test_path: &Path) -> PathBuf {
    let mut name = test_path.file_stem().unwrap_or_default().to_os_string();
    name.push(PREVIEW_SUFFIX);
    if let Some(ext) = test_path.extension() {
        name.push(".");
        name.push(ext);
    }
    dir.join(name)
}

fn skipped(path: &Path, reason: SkipReason) -> ProcessOutcome {
    info!(path = %path.display(), reason = %reason, "Skipping file");
    ProcessOutcome::Skipped(reason)
}

/// Lines that are neither blank nor `//` comments.
pub fn effective_line_count(source: &str) -> usize {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .count()
}
