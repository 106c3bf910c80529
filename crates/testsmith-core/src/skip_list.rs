//! File names that are never processed.

use std::collections::HashSet;
use std::path::Path;

/// Default skip-list: entry points and assembly metadata that rarely merit tests.
pub const DEFAULT_SKIPPED_FILES: &[&str] = &[
    "Program.cs",
    "Startup.cs",
    "AssemblyInfo.cs",
    "GlobalUsings.cs",
    "Usings.cs",
];

/// Case-insensitive set of bare file names to exclude.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipList {
    names: HashSet<String>,
}

impl SkipList {
    /// Builds a skip-list from file names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// An empty skip-list.
    pub fn empty() -> Self {
        Self {
            names: HashSet::new(),
        }
    }

    /// Returns true if the file name of `path` is on the list.
    pub fn should_skip(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.names.contains(&name.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    /// Number of names on the list.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true if nothing is skipped.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new(DEFAULT_SKIPPED_FILES)
    }
}
