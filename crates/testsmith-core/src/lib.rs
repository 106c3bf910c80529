//! testsmith core - shared logic for the watch, poll and generate modes.
//!
//! - **cache**: last-observed content per file, used to synthesize diffs
//! - **config**: state/config directory locations
//! - **localizer**: positional diff and method localization
//! - **parser**: pluggable method-boundary parsers keyed by extension
//! - **settings**: TOML + environment configuration
//! - **skip_list**: file names that are never processed
//! - **test_path**: source path to test path mapping

pub mod cache;
pub mod config;
pub mod error;
pub mod localizer;
pub mod parser;
pub mod settings;
pub mod skip_list;
pub mod test_path;

pub use cache::ContentCache;
pub use error::{CoreError, Result};
pub use localizer::{
    affected_methods, build_region, changed_lines, localize, AffectedRegion, ChangeSet,
};
pub use parser::{
    CFamilyParser, MethodBoundaryParser, MethodSpan, ParserRegistry, SourceTree, Span, TypeDecl,
    TypeKind,
};
pub use settings::{AiSettings, GitSettings, ProjectSettings, Provider, Settings};
pub use skip_list::SkipList;
pub use test_path::{derive_test_path, test_path_for};
