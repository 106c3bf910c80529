//! Terminal outcomes of the per-file pipeline.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output of one successful generation, before or after finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Temporary preview location, when preview mode wrote one.
    pub preview_path: Option<PathBuf>,
    /// Destination test file.
    pub test_path: PathBuf,
    /// Generated test file content.
    pub generated_code: String,
}

/// Why a file produced no generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// File name is on the configured skip-list.
    SkipListed,
    /// File only declares an interface/protocol.
    InterfaceOnly,
    /// Parser found no public methods.
    NoPublicMethods,
    /// Localization found no method touching the changed lines.
    NoAffectedMethods,
    /// Backend returned an empty response (or failed).
    EmptyResponse,
    /// An unexpected fault occurred while processing the file.
    Failed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkipListed => write!(f, "file is on the skip-list"),
            Self::InterfaceOnly => write!(f, "interface-only file"),
            Self::NoPublicMethods => write!(f, "no public methods found"),
            Self::NoAffectedMethods => write!(f, "no affected methods found"),
            Self::EmptyResponse => write!(f, "empty response from generation backend"),
            Self::Failed(message) => write!(f, "processing failed: {}", message),
        }
    }
}

/// The single terminal outcome a processing request resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Nothing was generated.
    Skipped(SkipReason),
    /// The result was written to its destination immediately.
    AutoFinalized {
        /// Destination test file.
        test_path: PathBuf,
    },
    /// The result waits for an explicit approve/reject from the caller.
    AwaitingApproval(GenerationResult),
}

impl ProcessOutcome {
    /// Returns the pending result, if any.
    pub fn into_pending(self) -> Option<GenerationResult> {
        match self {
            Self::AwaitingApproval(result) => Some(result),
            _ => None,
        }
    }

    /// Returns true for any skip outcome.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Returns the skip reason, if this is a skip.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            Self::Skipped(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> GenerationResult {
        GenerationResult {
            preview_path: None,
            test_path: PathBuf::from("tests/FooTests.cs"),
            generated_code: "class FooTests {}".to_string(),
        }
    }

    #[test]
    fn test_into_pending() {
        let outcome = ProcessOutcome::AwaitingApproval(result());
        assert_eq!(outcome.into_pending(), Some(result()));

        let outcome = ProcessOutcome::Skipped(SkipReason::EmptyResponse);
        assert!(outcome.into_pending().is_none());
    }

    #[test]
    fn test_skip_reason_accessors() {
        let outcome = ProcessOutcome::Skipped(SkipReason::InterfaceOnly);
        assert!(outcome.is_skipped());
        assert_eq!(outcome.skip_reason(), Some(&SkipReason::InterfaceOnly));

        let outcome = ProcessOutcome::AutoFinalized {
            test_path: PathBuf::from("tests/FooTests.cs"),
        };
        assert!(!outcome.is_skipped());
        assert!(outcome.skip_reason().is_none());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::InterfaceOnly.to_string(), "interface-only file");
        assert_eq!(
            SkipReason::Failed("boom".into()).to_string(),
            "processing failed: boom"
        );
    }
}
