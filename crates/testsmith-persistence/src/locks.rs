//! Per-destination write serialization.
//!
//! Two runs for the same source file may finish close together; their
//! finalize steps must not interleave on the shared test file. Runs for
//! different files never contend.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Async mutex per path, created on first use.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `path`.
    ///
    /// The returned guard releases the lock when dropped.
    pub async fn lock(&self, path: &Path) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        trace!(path = %path.display(), "Waiting for path lock");
        mutex.lock_owned().await
    }

    /// Number of paths that have been locked at least once.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_path_is_serialized() {
        let locks = Arc::new(PathLocks::new());
        let path = PathBuf::from("tests/FooTests.cs");

        let guard = locks.lock(&path).await;

        let contender = {
            let locks = locks.clone();
            let path = path.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&path).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_different_paths_do_not_contend() {
        let locks = PathLocks::new();
        let _a = locks.lock(Path::new("tests/ATests.cs")).await;
        let _b = locks.lock(Path::new("tests/BTests.cs")).await;
        assert_eq!(locks.len(), 2);
    }
}
