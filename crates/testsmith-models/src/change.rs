//! Filesystem change events.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of filesystem notification that was observed for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// File content was written.
    #[default]
    Modified,
    /// File was created.
    Created,
    /// File was renamed (the path is the new name).
    Renamed,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified => write!(f, "change"),
            Self::Created => write!(f, "create"),
            Self::Renamed => write!(f, "rename"),
        }
    }
}

/// One filesystem notification, as produced by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Path of the file that changed.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
    /// When the notification was received.
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Creates an event stamped with the current time.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Emitted once a path has been quiet for the debounce interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleSignal {
    /// Path whose changes have settled.
    pub path: PathBuf,
    /// The last change kind observed before the path went quiet.
    pub kind: ChangeKind,
}
