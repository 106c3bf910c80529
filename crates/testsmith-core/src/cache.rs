//! Last-observed content per file.
//!
//! The local watcher only sees "this file changed", so the previous content
//! is remembered here to synthesize the before/after pair the localizer needs.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::trace;

/// Concurrent map from file path to its most recently processed content.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: DashMap<PathBuf, String>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` for `path` and returns what was cached before.
    ///
    /// The first observation of a path returns `None`.
    pub fn swap(&self, path: &Path, content: String) -> Option<String> {
        let previous = self.entries.insert(path.to_path_buf(), content);
        trace!(path = %path.display(), had_previous = previous.is_some(), "Content cached");
        previous
    }

    /// Returns a copy of the cached content for `path`.
    pub fn get(&self, path: &Path) -> Option<String> {
        self.entries.get(path).map(|entry| entry.value().clone())
    }

    /// Forgets `path`.
    pub fn remove(&self, path: &Path) -> Option<String> {
        self.entries.remove(path).map(|(_, content)| content)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_returns_previous() {
        let cache = ContentCache::new();
        let path = Path::new("src/Foo.cs");

        assert_eq!(cache.swap(path, "v1".into()), None);
        assert_eq!(cache.swap(path, "v2".into()), Some("v1".to_string()));
        assert_eq!(cache.get(path), Some("v2".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove() {
        let cache = ContentCache::new();
        let path = Path::new("src/Foo.cs");
        cache.swap(path, "v1".into());

        assert_eq!(cache.remove(path), Some("v1".to_string()));
        assert!(cache.is_empty());
        assert!(cache.get(path).is_none());
    }
}
