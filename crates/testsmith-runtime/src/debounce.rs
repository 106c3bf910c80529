//! Per-path debouncing of change notifications.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use testsmith_models::{ChangeKind, SettleSignal};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

/// Pending timer for one path.
#[derive(Debug)]
struct Entry {
    id: u64,
    token: CancellationToken,
    kind: ChangeKind,
    fires_at: Instant,
}

/// Collapses bursts of notifications on the same path into one
/// [`SettleSignal`] once the path has been quiet for the interval.
///
/// At most one timer is live per path. Timers for different paths are
/// independent. Every timer token is a child of the engine's root token.
pub struct DebounceEngine {
    interval: Duration,
    entries: Arc<DashMap<PathBuf, Entry>>,
    next_id: AtomicU64,
    settled_tx: mpsc::UnboundedSender<SettleSignal>,
    root: CancellationToken,
}

impl DebounceEngine {
    /// Creates an engine delivering settle signals to `settled_tx`.
    pub fn new(
        interval: Duration,
        settled_tx: mpsc::UnboundedSender<SettleSignal>,
        root: CancellationToken,
    ) -> Self {
        Self {
            interval,
            entries: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            settled_tx,
            root,
        }
    }

    /// The quiet interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Restarts the quiet timer for `path`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn notify(&self, path: PathBuf, kind: ChangeKind) {
        if self.root.is_cancelled() {
            trace!(path = %path.display(), "Engine stopped, ignoring notification");
            return;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = self.root.child_token();
        let fires_at = Instant::now() + self.interval;

        let entry = Entry {
            id,
            token: token.clone(),
            kind,
            fires_at,
        };
        if let Some(previous) = self.entries.insert(path.clone(), entry) {
            previous.token.cancel();
        }

        let entries = Arc::clone(&self.entries);
        let settled_tx = self.settled_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(path = %path.display(), %kind, "Debounced");
                }
                _ = tokio::time::sleep_until(fires_at) => {
                    // A newer notification may have replaced this entry
                    // between expiry and removal.
                    if entries.remove_if(&path, |_, e| e.id == id).is_none() {
                        return;
                    }
                    debug!(path = %path.display(), %kind, "Path settled");
                    if let Err(e) = settled_tx.send(SettleSignal { path, kind }) {
                        warn!(path = %e.0.path.display(), "Settle signal dropped, receiver closed");
                    }
                }
            }
        });
    }

    /// Kind of the pending notification for `path`, if a timer is live.
    pub fn pending_kind(&self, path: &Path) -> Option<ChangeKind> {
        self.entries.get(path).map(|e| e.kind)
    }

    /// When the live timer for `path` fires, if there is one.
    pub fn fires_at(&self, path: &Path) -> Option<Instant> {
        self.entries.get(path).map(|e| e.fires_at)
    }

    /// Number of paths with a live timer.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Cancels and drops every pending timer.
    pub fn stop(&self) {
        for entry in self.entries.iter() {
            entry.token.cancel();
        }
        self.entries.clear();
        debug!("Debounce timers cleared");
    }
}

impl Drop for DebounceEngine {
    fn drop(&mut self) {
        for entry in self.entries.iter() {
            entry.token.cancel();
        }
    }
}
