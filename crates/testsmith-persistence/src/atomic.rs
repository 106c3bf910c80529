//! Atomic file operations for crash-safe test-file writes.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::trace;

use crate::error::{PersistenceError, Result};

/// Writes data to a file atomically, creating parent directories.
///
/// The destination is replaced wholesale, so writing identical data twice
/// leaves the file byte-identical.
///
/// # Errors
/// Returns an error if a directory cannot be created or the write or rename fails.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(|source| PersistenceError::DirectoryError {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    // Same directory as the target so the rename never crosses filesystems.
    let mut temp_file =
        tempfile::NamedTempFile::new_in(dir).map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .write_all(data)
        .and_then(|_| temp_file.flush())
        .map_err(|source| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source,
        })?;

    temp_file
        .persist(path)
        .map_err(|e| PersistenceError::WriteError {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    trace!(path = %path.display(), bytes = data.len(), "Atomic write complete");
    Ok(())
}

/// Writes text to a file atomically.
pub fn atomic_write_str(path: &Path, text: &str) -> Result<()> {
    atomic_write(path, text.as_bytes())
}

/// Reads a text file, returning an empty string if it doesn't exist.
pub fn read_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(PersistenceError::ReadError {
            path: path.to_path_buf(),
            source,
        }),
    }
}
