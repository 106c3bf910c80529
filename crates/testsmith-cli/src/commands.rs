//! Command handlers for CLI subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use testsmith_core::{ParserRegistry, Settings};
use testsmith_generation::{GenerationConfig, HttpGenerationClient};
use testsmith_models::{GenerationResult, ProcessOutcome, ProcessingRequest, ProjectRoots};
use testsmith_orchestrator::{Orchestrator, OrchestratorConfig};
use testsmith_remote::{CommitterConfig, GitHubClient};
use testsmith_runtime::{RemotePoller, RuntimeConfig, RuntimeError, WatchRuntime};
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cli::Commands;
use crate::error::{CommandError, Result};

const FILE_PROMPT: &str = "Enter the path to the source file to generate/update tests for (or 'exit' to quit): ";
const APPROVAL_PROMPT: &str = "Approve and update the test file? (y/N) ";

/// Execute a CLI command.
pub fn execute(command: Commands, config_path: Option<&Path>) -> Result<()> {
    let settings = Settings::load(config_path)?;
    debug!(?config_path, "Settings loaded");

    match command {
        Commands::Watch { project } => cmd_watch(&settings, &project),
        Commands::Poll => cmd_poll(&settings),
        Commands::Generate { file, project } => cmd_generate(&settings, file, project),
    }
}

/// Local auto mode: finalize generated tests without asking.
fn cmd_watch(settings: &Settings, project: &Path) -> Result<()> {
    settings.validate()?;
    let project = resolve_dir(project)?;
    let roots = project_roots(settings, project);
    let orchestrator = build_orchestrator(settings, false)?;
    let config = runtime_config(settings)?;

    println!("Monitoring source folder: {}", roots.src_root().display());
    println!("Tests will be updated in: {}", roots.tests_root().display());

    let rt = Runtime::new()?;
    rt.block_on(async {
        let mut runtime = WatchRuntime::new(roots, orchestrator, config);
        runtime.start().await?;
        println!("Watching for changes, press Ctrl-C to exit.");

        tokio::signal::ctrl_c().await?;
        runtime.shutdown().await?;
        Ok::<(), CommandError>(())
    })
}

/// Remote mode: commit generated tests back and open one PR per commit.
fn cmd_poll(settings: &Settings) -> Result<()> {
    settings.validate_remote()?;

    let repository_url = settings.git.repository_url.clone().unwrap_or_default();
    let token = settings.git.token.clone().unwrap_or_default();
    let host = Arc::new(GitHubClient::new(&repository_url, token)?);
    let roots = ProjectRoots::new(
        settings.git.project_folder.clone(),
        settings.project.src_folder.clone(),
        settings.project.tests_folder.clone(),
    );
    let poller = RemotePoller::new(
        host,
        build_orchestrator(settings, false)?,
        CommitterConfig::new(settings.git.main_branch.clone(), settings.git.branch_prefix.clone()),
        settings.skip_list(),
        roots,
        runtime_config(settings)?,
    );

    println!(
        "Polling {} ({}) every {}s, press Ctrl-C to exit.",
        repository_url, settings.git.main_branch, settings.git.poll_interval_secs
    );

    let rt = Runtime::new()?;
    rt.block_on(async {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poller.run(cancel.clone()));

        tokio::signal::ctrl_c().await?;
        info!("Stopping remote poller");
        cancel.cancel();
        handle
            .await
            .map_err(|e| RuntimeError::Shutdown(format!("poller task panicked: {}", e)))?;
        Ok::<(), CommandError>(())
    })
}

/// Manual mode: preview, then approve or reject each result.
fn cmd_generate(settings: &Settings, file: Option<PathBuf>, project: Option<PathBuf>) -> Result<()> {
    settings.validate()?;
    let project = match project {
        Some(dir) => resolve_dir(&dir)?,
        None => std::env::current_dir()?,
    };
    let session = ManualSession {
        roots: project_roots(settings, project),
        orchestrator: build_orchestrator(settings, true)?,
        sample_reference: settings.sample_reference()?,
        rt: Runtime::new()?,
        editor: DefaultEditor::new()?,
    };

    match file {
        Some(file) => session.run_once(&file),
        None => session.run_loop(),
    }
}

struct ManualSession {
    roots: ProjectRoots,
    orchestrator: Arc<Orchestrator>,
    sample_reference: String,
    rt: Runtime,
    editor: DefaultEditor,
}

impl ManualSession {
    fn run_loop(mut self) -> Result<()> {
        loop {
            let input = match self.editor.readline(FILE_PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let input = input.trim();
            if input.eq_ignore_ascii_case("exit") {
                break;
            }
            let path = PathBuf::from(input);
            if input.is_empty() || !path.is_file() {
                println!("Invalid file path. Please try again.");
                continue;
            }
            let _ = self.editor.add_history_entry(input);
            self.process(&path)?;
        }
        Ok(())
    }

    fn run_once(mut self, file: &Path) -> Result<()> {
        if !file.is_file() {
            return Err(CommandError::InvalidPath(file.to_path_buf()));
        }
        self.process(file)
    }

    fn process(&mut self, file: &Path) -> Result<()> {
        let file = file.canonicalize()?;
        let request = ProcessingRequest::new(file, self.roots.clone())
            .with_sample_reference(self.sample_reference.clone())
            .interactive(true);

        match self.rt.block_on(self.orchestrator.process(&request)) {
            ProcessOutcome::AwaitingApproval(result) => self.review(&result)?,
            ProcessOutcome::Skipped(reason) => println!("No tests generated: {}", reason),
            ProcessOutcome::AutoFinalized { test_path } => {
                println!("Test file updated at: {}", test_path.display())
            }
        }
        println!("Processing completed for this file.");
        Ok(())
    }

    fn review(&mut self, result: &GenerationResult) -> Result<()> {
        match &result.preview_path {
            Some(preview) => println!(
                "Please review the generated test code in the temporary file: {}",
                preview.display()
            ),
            None => println!("{}", result.generated_code),
        }

        let answer = match self.editor.readline(APPROVAL_PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => String::new(),
            Err(e) => return Err(e.into()),
        };

        if is_approval(&answer) {
            self.rt.block_on(self.orchestrator.finalize(result))?;
            println!("Test file updated at: {}", result.test_path.display());
        } else {
            self.orchestrator.reject(result);
            println!("Changes were not applied. The generated code is still in the preview file.");
        }
        Ok(())
    }
}

/// `y` or `yes`, any case.
pub fn is_approval(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn build_orchestrator(settings: &Settings, preview: bool) -> Result<Arc<Orchestrator>> {
    let parsers = ParserRegistry::with_defaults();
    parsers.for_extension(&settings.project.code_file_extension)?;

    let client = HttpGenerationClient::new(GenerationConfig::from_settings(&settings.ai)?)?;
    let mut config = OrchestratorConfig::from_settings(settings).with_parsers(parsers);
    if preview {
        config = config.with_preview(true);
    }
    info!(
        provider = %settings.ai.provider,
        model = %settings.ai.model,
        preview = config.preview,
        "Generation backend ready"
    );
    Ok(Arc::new(Orchestrator::new(Arc::new(client), config)))
}

fn runtime_config(settings: &Settings) -> Result<RuntimeConfig> {
    Ok(RuntimeConfig::from_settings(settings).with_sample_reference(settings.sample_reference()?))
}

fn project_roots(settings: &Settings, project: PathBuf) -> ProjectRoots {
    ProjectRoots::new(
        project,
        settings.project.src_folder.clone(),
        settings.project.tests_folder.clone(),
    )
}

/// Absolute form of an existing directory.
fn resolve_dir(dir: &Path) -> Result<PathBuf> {
    let dir = testsmith_core::settings::expand_path(dir);
    if !dir.is_dir() {
        return Err(CommandError::InvalidPath(dir));
    }
    Ok(dir.canonicalize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_approval() {
        assert!(is_approval("y"));
        assert!(is_approval(" YES "));
        assert!(!is_approval(""));
        assert!(!is_approval("n"));
        assert!(!is_approval("yep"));
    }

    #[test]
    fn test_resolve_dir() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_dir(dir.path()).unwrap();
        assert!(resolved.is_absolute());

        let file = dir.path().join("Foo.cs");
        std::fs::write(&file, "class Foo {}").unwrap();
        assert!(matches!(resolve_dir(&file), Err(CommandError::InvalidPath(_))));
    }

    #[test]
    fn test_project_roots_from_settings() {
        let mut settings = Settings::default();
        settings.project.src_folder = PathBuf::from("lib");
        let roots = project_roots(&settings, PathBuf::from("/work/app"));
        assert_eq!(roots.src_root(), PathBuf::from("/work/app/lib"));
        assert_eq!(roots.tests_root(), PathBuf::from("/work/app/tests"));
    }

    #[test]
    fn test_unsupported_extension_fails_at_startup() {
        let mut settings = Settings::default();
        settings.project.code_file_extension = ".py".to_string();
        settings.ai.model = "m".to_string();
        assert!(matches!(
            build_orchestrator(&settings, false),
            Err(CommandError::Core(_))
        ));
    }
}
