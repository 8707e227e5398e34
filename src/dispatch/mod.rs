//! The watch lifecycle: register, receive, handle, re-arm.
//!
//! The store's notification primitive is one-shot: each subscription delivers
//! at most one event and is then spent. Continuous observation is built by
//! re-subscribing inside the cycle that consumes the event, forming a
//! self-sustaining chain of single-shot watches.
//!
//! Each watched path runs as an explicit state machine:
//!
//! ```text
//! Unregistered --start_all--> Registered --event--> Handling
//!       Registered <--re-arm-- Handling --re-arm exhausted--> Failed
//! ```
//!
//! Re-arm is the *terminal* step of handling. Two properties fall out of
//! that ordering: the same path never handles two events concurrently (the
//! next notification cannot arrive before re-arm), and no update is missed
//! (the value is fetched after the notification, so it is always the latest
//! at or after the change; a change landing between handling and re-arm
//! simply surfaces on the next fetch).

use crate::artifact::AtomicFileWriter;
use crate::error::{MirrorError, Result};
use crate::registry::PathRegistry;
use crate::render;
use crate::store::{CoordinationStore, WatchEvent, WatchReceiver};
use crate::view::LocalView;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle state of one watched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No subscription exists yet.
    Unregistered,
    /// A one-shot subscription is active; awaiting its notification.
    Registered,
    /// A notification fired; fetch, render, and persist are in progress.
    Handling,
    /// Re-registration could not be completed; the path is no longer
    /// watched. Other paths are unaffected.
    Failed,
}

/// Backoff policy for retrying a failed watch re-registration.
///
/// Applies only to re-arm after a notification has been handled. Initial
/// registration in [`WatchDispatcher::start_all`] is not retried — a store
/// that is down at startup is a deployment problem, not a transient one.
#[derive(Debug, Clone, Copy)]
pub struct RearmPolicy {
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Ceiling for the doubling delay.
    pub max_backoff: Duration,
    /// Total attempts before the path transitions to [`WatchState::Failed`].
    pub max_attempts: u32,
}

impl Default for RearmPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            max_attempts: 8,
        }
    }
}

/// Owns the watch lifecycle for every path in the registry.
///
/// One store handle, one registry, one artifact directory. `start_all`
/// spawns a task per path; different paths handle concurrently (they touch
/// disjoint target files), while handling for the same path is serialized by
/// the re-arm-last ordering.
///
/// Clones share all state, so handing a clone to each spawned task is cheap.
#[derive(Clone)]
pub struct WatchDispatcher {
    store: Arc<dyn CoordinationStore>,
    registry: Arc<PathRegistry>,
    writer: AtomicFileWriter,
    view: LocalView,
    rearm: RearmPolicy,
    states: Arc<RwLock<HashMap<String, WatchState>>>,
}

impl WatchDispatcher {
    /// Create a dispatcher over the given store, registry, and artifact
    /// directory.
    pub fn new(
        store: Arc<dyn CoordinationStore>,
        registry: Arc<PathRegistry>,
        writer: AtomicFileWriter,
        view: LocalView,
        rearm: RearmPolicy,
    ) -> Self {
        let states = registry
            .watched_paths()
            .map(|w| (w.path, WatchState::Unregistered))
            .collect();

        Self {
            store,
            registry,
            writer,
            view,
            rearm,
            states: Arc::new(RwLock::new(states)),
        }
    }

    /// Current lifecycle state of a path, or `None` for paths outside the
    /// registry.
    pub fn state_of(&self, path: &str) -> Option<WatchState> {
        self.states.read().unwrap().get(path).copied()
    }

    fn set_state(&self, path: &str, state: WatchState) {
        self.states.write().unwrap().insert(path.to_string(), state);
    }

    /// Register a watch on every path in the registry and spawn its watch
    /// task.
    ///
    /// All initial registrations complete before any task is spawned, so a
    /// returned `Ok` means every path is in [`WatchState::Registered`].
    /// Returned handles resolve when their path shuts down or fails.
    ///
    /// # Errors
    ///
    /// Returns the first registration failure. Initial registration is not
    /// retried; the caller should treat this as fatal to startup.
    pub async fn start_all(&self, shutdown: watch::Receiver<bool>) -> Result<Vec<JoinHandle<()>>> {
        let mut armed = Vec::with_capacity(self.registry.len());
        for watched in self.registry.watched_paths() {
            debug!(path = %watched.path, "registering watch");
            let rx = self.store.watch(&watched.path).await?;
            self.set_state(&watched.path, WatchState::Registered);
            armed.push((watched.path, rx));
        }

        let handles = armed
            .into_iter()
            .map(|(path, rx)| {
                let dispatcher = self.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    dispatcher.watch_loop(path, rx, shutdown).await;
                })
            })
            .collect();

        Ok(handles)
    }

    /// Drive one path's state machine until shutdown or failure.
    async fn watch_loop(
        self,
        path: String,
        mut rx: WatchReceiver,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            // Registered: suspended until the subscription fires. This wait
            // is unbounded — a path that never changes is watched forever.
            let event = tokio::select! {
                event = &mut rx => event,
                _ = shutdown.changed() => {
                    debug!(path = %path, "shutdown while awaiting notification");
                    return;
                }
            };

            self.set_state(&path, WatchState::Handling);

            match event {
                Ok(event) => {
                    info!(
                        path = %event.path,
                        kind = %event.kind,
                        session = %event.session,
                        "received notification"
                    );
                    if let Err(e) = self.handle_notification(&event).await {
                        // Contained: the previous artifact stays in place
                        // and the watch is still re-armed below.
                        warn!(path = %path, error = %e, "handling failed; keeping previous artifact");
                    }
                }
                Err(_) => {
                    // Sender dropped without an event: the subscription died
                    // with the session. Re-arm decides whether we recover.
                    warn!(path = %path, "watch subscription dropped by store");
                }
            }

            // Re-arm unconditionally, as the terminal step of handling.
            match self.rearm(&path, &mut shutdown).await {
                Some(new_rx) => {
                    rx = new_rx;
                    self.set_state(&path, WatchState::Registered);
                }
                None => {
                    if *shutdown.borrow() {
                        return;
                    }
                    error!(path = %path, "re-registration exhausted; path is no longer watched");
                    self.set_state(&path, WatchState::Failed);
                    return;
                }
            }
        }
    }

    /// One handling cycle: fetch the current value, route it to the
    /// registered renderer, and atomically persist the artifact.
    ///
    /// Public entry point so embedders and tests can drive a cycle without a
    /// live subscription.
    ///
    /// # Errors
    ///
    /// Any step can fail — fetch ([`MirrorError::Connection`]), routing
    /// ([`MirrorError::Routing`]), parsing ([`MirrorError::Render`]), or
    /// persistence ([`MirrorError::Write`]). Failures leave the previous
    /// artifact file untouched.
    pub async fn handle_notification(&self, event: &WatchEvent) -> Result<()> {
        let path = event.path.as_str();

        // Fetch before anything else; the value is the latest at or after
        // the change that fired the watch.
        let raw = self.store.get(path).await?;

        // The store should never notify on a path we did not register, but
        // a routing miss must not take the process down.
        let handler = self
            .registry
            .resolve(path)
            .ok_or_else(|| MirrorError::Routing {
                path: path.to_string(),
            })?;

        let artifact = render::render(handler, path, &raw)?;
        self.writer.write(artifact.file_name, &artifact.content).await?;
        self.view.publish(handler, artifact.document);

        info!(path = %path, artifact = %artifact.file_name, "artifact updated");
        Ok(())
    }

    /// Reissue the watch on `path`, retrying with exponential backoff.
    ///
    /// Returns `None` when attempts are exhausted or shutdown is requested
    /// mid-backoff.
    async fn rearm(&self, path: &str, shutdown: &mut watch::Receiver<bool>) -> Option<WatchReceiver> {
        let mut delay = self.rearm.initial_backoff;

        for attempt in 1..=self.rearm.max_attempts {
            match self.store.watch(path).await {
                Ok(rx) => {
                    debug!(path = %path, attempt, "watch re-armed");
                    return Some(rx);
                }
                Err(e) => {
                    warn!(
                        path = %path,
                        attempt,
                        max_attempts = self.rearm.max_attempts,
                        error = %e,
                        "re-registration failed"
                    );
                }
            }

            if attempt == self.rearm.max_attempts {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => return None,
            }
            delay = (delay * 2).min(self.rearm.max_backoff);
        }

        None
    }
}
