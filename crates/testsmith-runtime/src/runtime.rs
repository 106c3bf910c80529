//! Local watch runtime.

use std::path::PathBuf;
use std::sync::Arc;

use testsmith_core::ContentCache;
use testsmith_models::{ProcessOutcome, ProcessingRequest, ProjectRoots, SettleSignal};
use testsmith_orchestrator::Orchestrator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::RuntimeConfig;
use crate::debounce::DebounceEngine;
use crate::error::{Result, RuntimeError};
use crate::watcher::LocalWatcher;

/// Wires watcher, debounce engine and orchestrator for a local project.
///
/// Settled paths are read from disk, diffed against the cached previous
/// content and processed non-interactively. Different paths are processed
/// concurrently.
pub struct WatchRuntime {
    roots: ProjectRoots,
    orchestrator: Arc<Orchestrator>,
    config: RuntimeConfig,
    cache: Arc<ContentCache>,
    cancel: CancellationToken,
    engine: Option<Arc<DebounceEngine>>,
    watcher: Option<LocalWatcher>,
    dispatcher_handle: Option<JoinHandle<()>>,
    started: bool,
}

impl WatchRuntime {
    pub fn new(roots: ProjectRoots, orchestrator: Arc<Orchestrator>, config: RuntimeConfig) -> Self {
        Self {
            roots,
            orchestrator,
            config,
            cache: Arc::new(ContentCache::new()),
            cancel: CancellationToken::new(),
            engine: None,
            watcher: None,
            dispatcher_handle: None,
            started: false,
        }
    }

    /// Start watching the source root.
    pub async fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }

        let src_root = self.roots.src_root();
        info!(src_root = %src_root.display(), "starting watch runtime");
        self.cancel = CancellationToken::new();

        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let engine = Arc::new(DebounceEngine::new(
            self.config.debounce_interval,
            settled_tx,
            self.cancel.child_token(),
        ));

        let mut watcher = LocalWatcher::new(Arc::clone(&engine));
        watcher.start(&src_root, &format!("*{}", self.config.extension))?;

        let dispatcher = Dispatcher {
            roots: self.roots.clone(),
            orchestrator: Arc::clone(&self.orchestrator),
            cache: Arc::clone(&self.cache),
            sample_reference: self.config.sample_reference.clone(),
            cancel: self.cancel.clone(),
        };
        self.dispatcher_handle = Some(tokio::spawn(dispatcher.run(settled_rx)));

        self.engine = Some(engine);
        self.watcher = Some(watcher);
        self.started = true;

        debug!("watch runtime started");
        Ok(())
    }

    /// Stop watching and cancel pending timers and in-flight runs.
    pub async fn shutdown(&mut self) -> Result<()> {
        if !self.started {
            return Err(RuntimeError::NotStarted);
        }

        info!("shutting down watch runtime");
        self.cancel.cancel();

        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if let Some(engine) = self.engine.take() {
            engine.stop();
        }
        if let Some(handle) = self.dispatcher_handle.take() {
            debug!("waiting for dispatcher to stop");
            handle
                .await
                .map_err(|e| RuntimeError::Shutdown(format!("dispatcher task panicked: {}", e)))?;
        }

        self.started = false;
        info!("watch runtime stopped");
        Ok(())
    }

    /// Check if the runtime has been started.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Content cache of processed files.
    pub fn cache(&self) -> Arc<ContentCache> {
        Arc::clone(&self.cache)
    }
}

impl Drop for WatchRuntime {
    fn drop(&mut self) {
        if self.started {
            self.cancel.cancel();
        }
    }
}

/// Turns settle signals into orchestrator runs.
struct Dispatcher {
    roots: ProjectRoots,
    orchestrator: Arc<Orchestrator>,
    cache: Arc<ContentCache>,
    sample_reference: String,
    cancel: CancellationToken,
}

impl Dispatcher {
    async fn run(self, mut settled_rx: mpsc::UnboundedReceiver<SettleSignal>) {
        let dispatcher = Arc::new(self);
        loop {
            let signal = tokio::select! {
                _ = dispatcher.cancel.cancelled() => break,
                signal = settled_rx.recv() => match signal {
                    Some(signal) => signal,
                    None => break,
                },
            };

            info!(path = %signal.path.display(), kind = %signal.kind, "Processing settled change");
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.handle(signal.path).await });
        }
        debug!("dispatcher stopped");
    }

    async fn handle(&self, path: PathBuf) {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read changed file");
                return;
            }
        };
        let previous = self.cache.swap(&path, content.clone()).unwrap_or_default();

        let request = ProcessingRequest::new(path.clone(), self.roots.clone())
            .with_contents(previous, content)
            .with_sample_reference(self.sample_reference.clone());

        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!(path = %path.display(), "Processing cancelled");
            }
            outcome = self.orchestrator.process(&request) => match outcome {
                ProcessOutcome::AutoFinalized { test_path } => {
                    info!(path = %path.display(), test_path = %test_path.display(), "Tests updated");
                }
                ProcessOutcome::Skipped(reason) => {
                    debug!(path = %path.display(), reason = %reason, "No tests generated");
                }
                ProcessOutcome::AwaitingApproval(result) => {
                    warn!(test_path = %result.test_path.display(), "Unexpected pending result in watch mode");
                }
            },
        }
    }
}
