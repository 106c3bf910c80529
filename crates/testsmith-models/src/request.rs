//! Processing requests handed to the orchestrator.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Project layout used to resolve source and test locations.
///
/// `src_root()` and `tests_root()` are always `project/<folder>`, whether the
/// project is a local directory or a folder inside a remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRoots {
    /// Project root (local directory, or repository-relative folder).
    pub project: PathBuf,
    /// Source folder, relative to the project root.
    pub src_folder: PathBuf,
    /// Tests folder, relative to the project root.
    pub tests_folder: PathBuf,
}

impl ProjectRoots {
    /// Creates a layout from a project root and its two folders.
    pub fn new(
        project: impl Into<PathBuf>,
        src_folder: impl Into<PathBuf>,
        tests_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project: project.into(),
            src_folder: src_folder.into(),
            tests_folder: tests_folder.into(),
        }
    }

    /// Directory that source paths are made relative to.
    pub fn src_root(&self) -> PathBuf {
        self.project.join(&self.src_folder)
    }

    /// Directory that test paths are mirrored into.
    pub fn tests_root(&self) -> PathBuf {
        self.project.join(&self.tests_folder)
    }

    /// Returns true if `path` lives under the tests root.
    pub fn is_test_path(&self, path: &Path) -> bool {
        path.starts_with(self.tests_root())
    }
}

/// Aggregated input for one run of the per-file pipeline.
///
/// Built by whichever caller detected the change and passed once; it is
/// never mutated by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingRequest {
    /// Path of the changed source file.
    pub file_path: PathBuf,
    /// Content before the change (empty when unknown or newly added).
    pub old_content: String,
    /// Content after the change (empty means "read from disk").
    pub new_content: String,
    /// Source extension including the dot, e.g. `.cs`.
    pub extension: String,
    /// Optional sample test used as a style reference.
    pub sample_reference: String,
    /// Existing test content supplied by the caller; `None` means "read from disk".
    pub existing_test_content: Option<String>,
    /// Whether the caller wants the result returned for approval.
    pub interactive: bool,
    /// Project layout.
    pub roots: ProjectRoots,
}

impl ProcessingRequest {
    /// Creates a non-interactive request with no content attached.
    ///
    /// The extension is taken from `file_path`.
    pub fn new(file_path: impl Into<PathBuf>, roots: ProjectRoots) -> Self {
        let file_path = file_path.into();
        let extension = file_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self {
            file_path,
            old_content: String::new(),
            new_content: String::new(),
            extension,
            sample_reference: String::new(),
            existing_test_content: None,
            interactive: false,
            roots,
        }
    }

    /// Attaches before/after content.
    pub fn with_contents(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_content = old.into();
        self.new_content = new.into();
        self
    }

    /// Attaches a sample test reference.
    pub fn with_sample_reference(mut self, sample: impl Into<String>) -> Self {
        self.sample_reference = sample.into();
        self
    }

    /// Attaches existing test content fetched by the caller.
    pub fn with_existing_tests(mut self, tests: impl Into<String>) -> Self {
        self.existing_test_content = Some(tests.into());
        self
    }

    /// Sets the interactive flag.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Returns true if both old and new content are available.
    pub fn has_both_contents(&self) -> bool {
        !self.old_content.trim().is_empty() && !self.new_content.trim().is_empty()
    }
}
