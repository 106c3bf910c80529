//! Mapping from a source file to its test file.
//!
//! `{src_root}/a/b/Foo.cs` maps to `{tests_root}/a/b/FooTests.cs`.

use std::path::{Path, PathBuf};

use testsmith_models::ProjectRoots;

use crate::error::{CoreError, Result};

/// Suffix appended to the file stem of a source file.
pub const TEST_SUFFIX: &str = "Tests";

/// Derives the test file path for `file_path`.
///
/// Pure and idempotent: the result depends only on the three inputs.
pub fn derive_test_path(src_root: &Path, tests_root: &Path, file_path: &Path) -> Result<PathBuf> {
    let relative = file_path
        .strip_prefix(src_root)
        .map_err(|_| CoreError::OutsideSourceRoot {
            path: file_path.to_path_buf(),
            root: src_root.to_path_buf(),
        })?;

    let stem = relative
        .file_stem()
        .ok_or_else(|| CoreError::InvalidPath(file_path.to_path_buf()))?;
    let mut name = stem.to_os_string();
    name.push(TEST_SUFFIX);
    if let Some(ext) = relative.extension() {
        name.push(".");
        name.push(ext);
    }

    let mut test_path = tests_root.to_path_buf();
    if let Some(parent) = relative.parent() {
        test_path.push(parent);
    }
    test_path.push(name);
    Ok(test_path)
}

/// Derives the test file path using a project layout.
pub fn test_path_for(roots: &ProjectRoots, file_path: &Path) -> Result<PathBuf> {
    derive_test_path(&roots.src_root(), &roots.tests_root(), file_path)
}
