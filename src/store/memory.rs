//! In-memory coordination store.
//!
//! Faithful to the remote contract — values keyed by hierarchical path,
//! one-shot watches that fire on the next change and then are spent. Used by
//! the test suite and useful for embedding the daemon without a real store.

use super::{CoordinationStore, EventKind, SessionState, WatchEvent, WatchReceiver};
use crate::error::{MirrorError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

#[derive(Default)]
struct Inner {
    values: HashMap<String, Vec<u8>>,
    watchers: HashMap<String, Vec<oneshot::Sender<WatchEvent>>>,
    watch_counts: HashMap<String, usize>,
    /// Number of upcoming `watch` calls that fail, for exercising re-arm
    /// error paths.
    watch_failures_left: usize,
}

/// In-memory [`CoordinationStore`] with one-shot watch semantics.
///
/// # Examples
///
/// ```rust
/// use confmirror::store::{CoordinationStore, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> confmirror::error::Result<()> {
/// let store = MemoryStore::new();
/// store.set("/app/s1/conf/allowList", br#"["uuid-1"]"#.to_vec());
///
/// let value = store.get("/app/s1/conf/allowList").await?;
/// assert_eq!(value, br#"["uuid-1"]"#);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value at `path`, firing any pending watches on it.
    ///
    /// Each pending watch receives exactly one event and is then spent, per
    /// the one-shot contract. A change with no pending watch is silent —
    /// exactly like a real store, which is why fetch-after-notify matters.
    pub fn set(&self, path: impl Into<String>, value: Vec<u8>) {
        let path = path.into();
        let senders = {
            let mut inner = self.inner.lock().unwrap();
            let kind = if inner.values.contains_key(&path) {
                EventKind::DataChanged
            } else {
                EventKind::Created
            };
            inner.values.insert(path.clone(), value);
            let senders = inner.watchers.remove(&path).unwrap_or_default();
            senders.into_iter().map(|s| (s, kind)).collect::<Vec<_>>()
        };

        for (sender, kind) in senders {
            let _ = sender.send(WatchEvent {
                kind,
                session: SessionState::Connected,
                path: path.clone(),
            });
        }
    }

    /// Remove the value at `path`, firing pending watches with a deletion
    /// event.
    pub fn delete(&self, path: &str) {
        let senders = {
            let mut inner = self.inner.lock().unwrap();
            inner.values.remove(path);
            inner.watchers.remove(path).unwrap_or_default()
        };

        for sender in senders {
            let _ = sender.send(WatchEvent {
                kind: EventKind::Deleted,
                session: SessionState::Connected,
                path: path.to_string(),
            });
        }
    }

    /// How many times `watch` has been called for `path`.
    ///
    /// Lets tests assert the re-arm invariant: N notifications on a path
    /// mean exactly N+1 registrations.
    pub fn watch_count(&self, path: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .watch_counts
            .get(path)
            .copied()
            .unwrap_or(0)
    }

    /// Whether a watch is currently pending on `path`.
    pub fn has_pending_watch(&self, path: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .watchers
            .get(path)
            .is_some_and(|w| !w.is_empty())
    }

    /// Make the next `n` calls to `watch` fail with a connection error.
    pub fn fail_next_watches(&self, n: usize) {
        self.inner.lock().unwrap().watch_failures_left = n;
    }
}

#[async_trait]
impl CoordinationStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .values
            .get(path)
            .cloned()
            .ok_or_else(|| MirrorError::Connection(format!("no value at '{}'", path)))
    }

    async fn watch(&self, path: &str) -> Result<WatchReceiver> {
        let mut inner = self.inner.lock().unwrap();

        *inner.watch_counts.entry(path.to_string()).or_insert(0) += 1;

        if inner.watch_failures_left > 0 {
            inner.watch_failures_left -= 1;
            return Err(MirrorError::Connection(format!(
                "watch registration refused for '{}'",
                path
            )));
        }

        let (tx, rx) = oneshot::channel();
        inner.watchers.entry(path.to_string()).or_default().push(tx);
        Ok(rx)
    }
}
