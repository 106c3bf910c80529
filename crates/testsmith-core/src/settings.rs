//! User settings loaded from TOML with environment overrides.
//!
//! Lookup order for the settings file:
//! 1. the path passed on the command line
//! 2. `./testsmith.toml`
//! 3. `~/.testsmith/config/config.toml`
//!
//! Missing files fall back to defaults. Secrets are usually supplied through
//! the environment (`TESTSMITH_AI_API_KEY`, `GITHUB_TOKEN`) rather than the file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config;
use crate::error::{CoreError, Result};
use crate::skip_list::{SkipList, DEFAULT_SKIPPED_FILES};

/// Overrides `ai.api_key`.
pub const AI_API_KEY_ENV: &str = "TESTSMITH_AI_API_KEY";
/// Overrides `ai.endpoint`.
pub const AI_ENDPOINT_ENV: &str = "TESTSMITH_AI_ENDPOINT";
/// Overrides `ai.model`.
pub const AI_MODEL_ENV: &str = "TESTSMITH_AI_MODEL";
/// Overrides `git.token`.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Default instruction placed at the top of every generation prompt.
pub const DEFAULT_PROMPT: &str = "Act as an expert C# developer. Generate xUnit tests for the following code with 100% code coverage.
The tests should follow the naming convention: MethodName_WhenCondition_ReturnsExpectedResult.
Only generate tests for public methods and constructors. Do not create tests for interfaces or private methods.
If existing tests are provided, update only the tests related to the method.";

/// Complete settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub project: ProjectSettings,
    pub ai: AiSettings,
    pub git: GitSettings,
    pub skipped_files: SkippedFilesSettings,
}

/// `[project]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Source folder relative to the project root.
    pub src_folder: PathBuf,
    /// Tests folder relative to the project root.
    pub tests_folder: PathBuf,
    /// Extension of the files to process, including the dot.
    pub code_file_extension: String,
    /// Optional sample test file used as a style reference.
    pub sample_unit_test: Option<PathBuf>,
    /// Effective line count above which only the affected region is sent.
    pub line_threshold: usize,
    /// Quiet interval before a changed file is processed.
    pub debounce_ms: u64,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            src_folder: PathBuf::from("src"),
            tests_folder: PathBuf::from("tests"),
            code_file_extension: ".cs".to_string(),
            sample_unit_test: None,
            line_threshold: 300,
            debounce_ms: 1000,
        }
    }
}

/// Generation backend flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// OpenAI-compatible completions endpoint.
    #[default]
    OpenAi,
    /// OpenRouter (or any OpenAI-style chat completions endpoint).
    OpenRouter,
    /// Local Ollama server.
    Ollama,
}

impl Provider {
    /// Endpoint used when none is configured, if the provider has one.
    pub fn default_endpoint(&self) -> Option<&'static str> {
        match self {
            Self::OpenAi => None,
            Self::OpenRouter => Some("https://openrouter.ai/api/v1/chat/completions"),
            Self::Ollama => Some("http://localhost:11434/api/generate"),
        }
    }

    /// Whether the provider needs an API key.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::OpenRouter => write!(f, "openrouter"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for Provider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "azure" => Ok(Self::OpenAi),
            "openrouter" => Ok(Self::OpenRouter),
            "ollama" | "deepseek" => Ok(Self::Ollama),
            other => Err(CoreError::Config(format!("unknown ai provider '{}'", other))),
        }
    }
}

/// `[ai]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub provider: Provider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Instruction placed at the top of every prompt.
    pub prompt: String,
    /// Write a preview file before finalizing.
    pub preview_result: bool,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            endpoint: None,
            api_key: None,
            model: String::new(),
            max_tokens: 4096,
            temperature: 0.2,
            prompt: DEFAULT_PROMPT.to_string(),
            preview_result: false,
        }
    }
}

impl AiSettings {
    /// The configured endpoint, or the provider default.
    pub fn resolved_endpoint(&self) -> Option<String> {
        self.endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| self.provider.default_endpoint().map(str::to_string))
    }
}

/// `[git]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSettings {
    /// Repository URL, e.g. `https://github.com/owner/repo`.
    pub repository_url: Option<String>,
    pub main_branch: String,
    pub token: Option<String>,
    /// Prefix of the branches created for each batch.
    pub branch_prefix: String,
    pub poll_interval_secs: u64,
    /// Project folder inside the repository (empty for the repository root).
    pub project_folder: PathBuf,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            repository_url: None,
            main_branch: "main".to_string(),
            token: None,
            branch_prefix: "testsmith/update-".to_string(),
            poll_interval_secs: 60,
            project_folder: PathBuf::new(),
        }
    }
}

/// `[skipped_files]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkippedFilesSettings {
    pub names: Vec<String>,
}

impl Default for SkippedFilesSettings {
    fn default() -> Self {
        Self {
            names: DEFAULT_SKIPPED_FILES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Loads settings from `path`, or from the default lookup locations.
    ///
    /// An explicit path that does not exist is an error; missing default
    /// files are not. Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(p) => {
                let p = expand_path(p);
                if !p.exists() {
                    return Err(CoreError::Config(format!(
                        "settings file {} does not exist",
                        p.display()
                    )));
                }
                Some(p)
            }
            None => [PathBuf::from(config::LOCAL_CONFIG_FILE), config::config_file()]
                .into_iter()
                .find(|p| p.exists()),
        };

        let mut settings = match resolved {
            Some(p) => {
                debug!(path = %p.display(), "Loading settings");
                let text = std::fs::read_to_string(&p).map_err(|source| CoreError::Read {
                    path: p.clone(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        };

        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Parses a settings document and normalizes it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(text)?;
        settings.normalize();
        Ok(settings)
    }

    /// Applies the environment overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Some(key) = non_empty_env(AI_API_KEY_ENV) {
            self.ai.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty_env(AI_ENDPOINT_ENV) {
            self.ai.endpoint = Some(endpoint);
        }
        if let Some(model) = non_empty_env(AI_MODEL_ENV) {
            self.ai.model = model;
        }
        if let Some(token) = non_empty_env(GITHUB_TOKEN_ENV) {
            self.git.token = Some(token);
        }
    }

    fn normalize(&mut self) {
        let ext = self.project.code_file_extension.trim();
        self.project.code_file_extension = if ext.is_empty() || ext.starts_with('.') {
            ext.to_string()
        } else {
            format!(".{}", ext)
        };
        self.project.sample_unit_test = self.project.sample_unit_test.as_deref().map(expand_path);
    }

    /// Checks what every mode needs.
    pub fn validate(&self) -> Result<()> {
        if self.project.code_file_extension.is_empty() {
            return Err(CoreError::MissingSetting("project.code_file_extension"));
        }
        if self.project.debounce_ms == 0 {
            return Err(CoreError::Config("project.debounce_ms must be positive".into()));
        }
        if self.ai.model.trim().is_empty() {
            return Err(CoreError::MissingSetting("ai.model"));
        }
        if self.ai.resolved_endpoint().is_none() {
            return Err(CoreError::MissingSetting("ai.endpoint"));
        }
        if self.ai.provider.requires_api_key()
            && self.ai.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(CoreError::MissingSetting("ai.api_key"));
        }
        Ok(())
    }

    /// Checks what the remote polling mode additionally needs.
    pub fn validate_remote(&self) -> Result<()> {
        self.validate()?;
        if self.git.repository_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
            return Err(CoreError::MissingSetting("git.repository_url"));
        }
        if self.git.token.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(CoreError::MissingSetting("git.token"));
        }
        if self.git.poll_interval_secs == 0 {
            return Err(CoreError::Config("git.poll_interval_secs must be positive".into()));
        }
        Ok(())
    }

    /// Builds the configured skip-list.
    pub fn skip_list(&self) -> SkipList {
        SkipList::new(&self.skipped_files.names)
    }

    /// Reads the sample unit test, or returns an empty string when none is set.
    pub fn sample_reference(&self) -> Result<String> {
        match &self.project.sample_unit_test {
            Some(path) => std::fs::read_to_string(path).map_err(|source| CoreError::Read {
                path: path.clone(),
                source,
            }),
            None => Ok(String::new()),
        }
    }
}

/// Expands `~` and environment variables in a path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
