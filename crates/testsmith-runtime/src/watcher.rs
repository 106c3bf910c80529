//! Recursive filesystem watch feeding the debounce engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use testsmith_models::{ChangeEvent, ChangeKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::debounce::DebounceEngine;
use crate::error::{Result, RuntimeError};

/// Case-insensitive file extension match built from a `*.cs` style pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extension: String,
}

impl ExtensionFilter {
    /// Accepts `*.cs`, `.cs` or `cs`.
    pub fn new(pattern: &str) -> Self {
        let extension = pattern
            .trim()
            .trim_start_matches('*')
            .trim_start_matches('.')
            .to_lowercase();
        Self { extension }
    }

    /// Returns true if `path` has the filtered extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase() == self.extension)
            .unwrap_or(false)
    }
}

/// Maps one notify event to the change events it implies.
///
/// Creates become `Created`, renames `Renamed` (keeping the new name) and
/// other modifications `Modified`. Everything else is dropped.
pub fn map_event(event: &Event, filter: &ExtensionFilter) -> Vec<ChangeEvent> {
    let (kind, paths): (ChangeKind, Vec<&PathBuf>) = match event.kind {
        EventKind::Create(_) => (ChangeKind::Created, event.paths.iter().collect()),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            (ChangeKind::Renamed, event.paths.last().into_iter().collect())
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            (ChangeKind::Renamed, event.paths.iter().collect())
        }
        EventKind::Modify(_) => (ChangeKind::Modified, event.paths.iter().collect()),
        _ => return Vec::new(),
    };

    paths
        .into_iter()
        .filter(|path| filter.matches(path))
        .map(|path| ChangeEvent::new(path.clone(), kind))
        .collect()
}

/// Watches a directory tree and forwards matching changes into a
/// [`DebounceEngine`].
pub struct LocalWatcher {
    engine: Arc<DebounceEngine>,
    watcher: Option<RecommendedWatcher>,
    forwarder: Option<JoinHandle<()>>,
}

impl LocalWatcher {
    pub fn new(engine: Arc<DebounceEngine>) -> Self {
        Self {
            engine,
            watcher: None,
            forwarder: None,
        }
    }

    /// Starts a recursive watch on `root` for files matching `file_pattern`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, root: &Path, file_pattern: &str) -> Result<()> {
        if self.watcher.is_some() {
            return Err(RuntimeError::AlreadyStarted);
        }

        let filter = ExtensionFilter::new(file_pattern);
        let (tx, mut rx) = mpsc::unbounded_channel::<ChangeEvent>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for change in map_event(&event, &filter) {
                        if tx.send(change).is_err() {
                            trace!("Watch forwarder gone, dropping event");
                        }
                    }
                }
                Err(e) => warn!(error = %e, "Watch error"),
            },
            NotifyConfig::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;

        let engine = Arc::clone(&self.engine);
        let forwarder = tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                debug!(path = %change.path.display(), kind = %change.kind, "File change observed");
                engine.notify(change.path, change.kind);
            }
        });

        self.watcher = Some(watcher);
        self.forwarder = Some(forwarder);

        info!(root = %root.display(), pattern = file_pattern, "Watching for changes");
        Ok(())
    }

    /// Returns true while a watch is active.
    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Drops the OS watch and its forwarding task.
    pub fn stop(&mut self) {
        // Dropping the watcher drops the sender, which ends the forwarder.
        if self.watcher.take().is_some() {
            info!("Stopped watching");
        }
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}

impl Drop for LocalWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind};

    fn filter() -> ExtensionFilter {
        ExtensionFilter::new("*.cs")
    }

    #[test]
    fn test_extension_filter_patterns() {
        for pattern in ["*.cs", ".cs", "cs", "*.CS"] {
            let filter = ExtensionFilter::new(pattern);
            assert!(filter.matches(Path::new("src/Foo.cs")), "{}", pattern);
            assert!(filter.matches(Path::new("src/Foo.CS")), "{}", pattern);
            assert!(!filter.matches(Path::new("src/Foo.csx")), "{}", pattern);
            assert!(!filter.matches(Path::new("src/cs")), "{}", pattern);
        }
    }

    #[test]
    fn test_map_create_and_modify() {
        let created = Event::new(EventKind::Create(CreateKind::File)).add_path("src/Foo.cs".into());
        let changes = map_event(&created, &filter());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Created);

        let modified = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path("src/Foo.cs".into());
        let changes = map_event(&modified, &filter());
        assert_eq!(changes[0].kind, ChangeKind::Modified);
        assert_eq!(changes[0].path, PathBuf::from("src/Foo.cs"));
    }

    #[test]
    fn test_map_rename_uses_new_path() {
        let renamed = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("src/Old.cs".into())
            .add_path("src/New.cs".into());
        let changes = map_event(&renamed, &filter());
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, PathBuf::from("src/New.cs"));
        assert_eq!(changes[0].kind, ChangeKind::Renamed);

        let from = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path("src/Old.cs".into());
        assert!(map_event(&from, &filter()).is_empty());
    }

    #[test]
    fn test_map_ignores_other_kinds_and_extensions() {
        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path("src/Foo.cs".into());
        assert!(map_event(&removed, &filter()).is_empty());

        let accessed = Event::new(EventKind::Access(AccessKind::Any)).add_path("src/Foo.cs".into());
        assert!(map_event(&accessed, &filter()).is_empty());

        let other = Event::new(EventKind::Create(CreateKind::File)).add_path("src/readme.md".into());
        assert!(map_event(&other, &filter()).is_empty());
    }
}
