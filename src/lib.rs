//! # confmirror
//!
//! Mirrors configuration held in a remote hierarchical coordination store to
//! local artifact files, atomically, for as long as the process lives.
//!
//! ## Overview
//!
//! `confmirror` is the core of a long-running sync daemon. It watches a
//! fixed, identity-derived set of remote paths; whenever one changes it
//! fetches the new value, renders it into a complete local configuration
//! file, and swaps that file into place with a single rename so co-located
//! readers never observe a partial write. The store's watches are one-shot,
//! so every handled notification ends by re-arming the watch on its path —
//! a self-sustaining chain of single-shot subscriptions.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confmirror::prelude::*;
//! use confmirror::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> confmirror::error::Result<()> {
//! let config = DaemonConfig::builder()
//!     .with_app_name("mygame")
//!     .with_server_name("server-3")
//!     .with_artifact_dir("/var/lib/mygame/conf")
//!     .build()?;
//!
//! // Any CoordinationStore implementation works here; MemoryStore is the
//! // bundled one. A real deployment passes its connected store client.
//! let store = Arc::new(MemoryStore::new());
//!
//! let handle = Daemon::new(config, store).start().await?;
//! handle.join().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - **Atomic artifacts**: readers see the full old file or the full new
//!   file, never a mixture or a truncated file
//! - **Stale-but-valid over corrupt**: a malformed remote value is logged
//!   and skipped; the previous artifact stays in place
//! - **No missed updates**: values are fetched after the notification, so
//!   every handled event observes the latest state at or after its change
//! - **Per-path isolation**: a failing path never takes down another path
//!   or the daemon (only startup errors are fatal)
//!
//! The watched path set is fixed at startup; this is not a general pub/sub
//! system and exposes no network API — its output is the file system, plus
//! an optional in-process [`view::LocalView`] accessor.

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod artifact;
pub mod daemon;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod render;
pub mod store;
pub mod view;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::daemon::{Daemon, DaemonConfig, DaemonHandle};
    pub use crate::dispatch::{RearmPolicy, WatchDispatcher, WatchState};
    pub use crate::error::{MirrorError, Result};
    pub use crate::registry::{HandlerKind, PathRegistry};
    pub use crate::store::CoordinationStore;
}
