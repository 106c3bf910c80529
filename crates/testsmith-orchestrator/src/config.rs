//! Orchestrator configuration.

use std::path::PathBuf;

use testsmith_core::settings::{Settings, DEFAULT_PROMPT};
use testsmith_core::{ParserRegistry, SkipList};

/// Knobs of the per-file pipeline.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Effective line count above which only the affected region is sent.
    pub line_threshold: usize,
    /// Write a preview file before finalizing or returning the result.
    pub preview: bool,
    /// Directory preview files are written to.
    pub preview_dir: PathBuf,
    /// Instruction placed at the top of every prompt.
    pub prompt_template: String,
    /// File names never processed.
    pub skip_list: SkipList,
    /// Parsers by extension.
    pub parsers: ParserRegistry,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            line_threshold: 300,
            preview: false,
            preview_dir: testsmith_core::config::preview_dir(),
            prompt_template: DEFAULT_PROMPT.to_string(),
            skip_list: SkipList::default(),
            parsers: ParserRegistry::with_defaults(),
        }
    }
}

impl OrchestratorConfig {
    /// Builds the configuration from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::default()
            .with_line_threshold(settings.project.line_threshold)
            .with_preview(settings.ai.preview_result)
            .with_prompt_template(settings.ai.prompt.clone())
            .with_skip_list(settings.skip_list())
    }

    pub fn with_line_threshold(mut self, threshold: usize) -> Self {
        self.line_threshold = threshold;
        self
    }

    pub fn with_preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn with_preview_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.preview_dir = dir.into();
        self
    }

    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    pub fn with_skip_list(mut self, skip_list: SkipList) -> Self {
        self.skip_list = skip_list;
        self
    }

    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }
}
