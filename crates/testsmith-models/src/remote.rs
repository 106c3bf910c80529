//! Records exchanged with the remote VCS host.

use serde::{Deserialize, Serialize};

/// A commit on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit SHA.
    pub sha: String,
    /// Parent SHAs, first parent first.
    #[serde(default)]
    pub parents: Vec<String>,
}

impl CommitInfo {
    /// Creates a commit record.
    pub fn new(sha: impl Into<String>, parents: Vec<String>) -> Self {
        Self {
            sha: sha.into(),
            parents,
        }
    }

    /// The first parent, if the commit has one.
    pub fn first_parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }
}

/// Status of a file within a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    #[default]
    Modified,
    Removed,
    Renamed,
    #[serde(other)]
    Other,
}

/// One entry of a commit's file-level change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Repository-relative path.
    pub path: String,
    /// Change status.
    pub status: FileStatus,
    /// Lines added.
    pub additions: u32,
    /// Lines deleted.
    pub deletions: u32,
}

/// A relevant changed file with its content on both sides of the commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileChange {
    /// Repository-relative path.
    pub path: String,
    /// Content at the first parent (empty for new files).
    pub old_content: String,
    /// Content at the commit (empty for deleted files).
    pub new_content: String,
}

/// A pull request opened on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: u64,
    /// Human-viewable URL.
    pub html_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_parent() {
        let commit = CommitInfo::new("c2", vec!["c1".into(), "m1".into()]);
        assert_eq!(commit.first_parent(), Some("c1"));

        let root = CommitInfo::new("c0", vec![]);
        assert!(root.first_parent().is_none());
    }

    #[test]
    fn test_file_status_unknown_maps_to_other() {
        let status: FileStatus = serde_json::from_str("\"copied\"").unwrap();
        assert_eq!(status, FileStatus::Other);
        let status: FileStatus = serde_json::from_str("\"added\"").unwrap();
        assert_eq!(status, FileStatus::Added);
    }
}
