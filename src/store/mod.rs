//! The coordination-store capability surface.
//!
//! The core never talks a wire protocol itself. It consumes a narrow
//! capability surface — read a path, register a one-shot watch on a path —
//! and leaves connection establishment, sessions, and leader discovery to
//! the client implementation behind the trait.
//!
//! Watches are one-shot by contract: each registration delivers at most one
//! event, after which the subscription is spent and must be reissued to keep
//! observing. The [`dispatch`](crate::dispatch) module builds persistent
//! observation out of this primitive by re-arming inside the handling cycle.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::oneshot;

/// What changed at a watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// The value at the path was replaced.
    DataChanged,
    /// The path came into existence.
    Created,
    /// The path was removed.
    Deleted,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::DataChanged => write!(f, "data-changed"),
            EventKind::Created => write!(f, "created"),
            EventKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// Session state reported alongside an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The session to the store is healthy.
    Connected,
    /// The client lost its connection; the session may still recover.
    Disconnected,
    /// The session is gone for good.
    Expired,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Connected => write!(f, "connected"),
            SessionState::Disconnected => write!(f, "disconnected"),
            SessionState::Expired => write!(f, "expired"),
        }
    }
}

/// A single change notification delivered by a one-shot watch.
///
/// Carries only metadata — the value itself must be fetched with
/// [`CoordinationStore::get`] after the event arrives. Fetching after the
/// notification guarantees the handler sees the latest value at or after
/// the change.
#[derive(Debug, Clone)]
pub struct WatchEvent {
    /// What kind of change fired the watch.
    pub kind: EventKind,
    /// Session state at delivery time.
    pub session: SessionState,
    /// The path the event is about.
    pub path: String,
}

/// Receiving half of a one-shot watch subscription.
///
/// Resolves at most once; a dropped sender (store shutdown, session loss)
/// surfaces as a receive error.
pub type WatchReceiver = oneshot::Receiver<WatchEvent>;

/// Capability surface of the remote hierarchical coordination store.
///
/// Implementations must be safe to call concurrently from multiple watch
/// tasks; the dispatcher shares one handle across every watched path without
/// external locking.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Fetch the current value at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Connection`](crate::error::MirrorError::Connection)
    /// if the store cannot be reached or the path does not exist.
    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    /// Register a one-shot watch on `path`.
    ///
    /// The returned receiver resolves with the next change event for the
    /// path, after which the subscription is spent.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Connection`](crate::error::MirrorError::Connection)
    /// if the subscription cannot be established.
    async fn watch(&self, path: &str) -> Result<WatchReceiver>;
}
