//! Daemon assembly: configuration, startup wiring, heartbeat, shutdown.
//!
//! The daemon ties the pieces together at startup — build the registry,
//! register every watch, spawn the heartbeat — and then has nothing left to
//! do: all real work happens on the notification tasks. The foreground
//! surface is a handle the embedding process can idle on or use to shut
//! down gracefully.

mod config;

pub use config::{DaemonConfig, DaemonConfigBuilder};

use crate::artifact::AtomicFileWriter;
use crate::dispatch::{WatchDispatcher, WatchState};
use crate::error::Result;
use crate::registry::PathRegistry;
use crate::store::CoordinationStore;
use crate::view::LocalView;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// The configuration-mirroring daemon.
///
/// # Examples
///
/// ```rust,no_run
/// use confmirror::prelude::*;
/// use confmirror::store::MemoryStore;
/// use std::sync::Arc;
///
/// # async fn example() -> confmirror::error::Result<()> {
/// let config = DaemonConfig::builder()
///     .with_app_name("mygame")
///     .with_server_name("server-3")
///     .with_artifact_dir("/var/lib/mygame/conf")
///     .build()?;
///
/// let store = Arc::new(MemoryStore::new());
/// let handle = Daemon::new(config, store).start().await?;
///
/// // Block forever; watches keep firing in the background.
/// handle.join().await;
/// # Ok(())
/// # }
/// ```
pub struct Daemon {
    config: DaemonConfig,
    store: Arc<dyn CoordinationStore>,
}

impl Daemon {
    /// Create a daemon over an already-connected store handle.
    pub fn new(config: DaemonConfig, store: Arc<dyn CoordinationStore>) -> Self {
        Self { config, store }
    }

    /// Build the registry, register every watch, and start the heartbeat.
    ///
    /// Returns once every path is registered; from then on the daemon runs
    /// entirely on background tasks.
    ///
    /// # Errors
    ///
    /// Fails on a malformed identity or if any initial watch registration
    /// fails. Both abort startup — a daemon that cannot watch its full path
    /// set must not run half-configured.
    pub async fn start(self) -> Result<DaemonHandle> {
        let registry = Arc::new(PathRegistry::build(
            &self.config.app_name,
            &self.config.server_name,
        )?);
        info!(
            app = %self.config.app_name,
            server = %self.config.server_name,
            paths = registry.len(),
            "starting configuration mirror"
        );

        let view = LocalView::new();
        let dispatcher = Arc::new(WatchDispatcher::new(
            self.store,
            registry,
            AtomicFileWriter::new(&self.config.artifact_dir),
            view.clone(),
            self.config.rearm,
        ));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut tasks = dispatcher.start_all(shutdown_rx.clone()).await?;
        tasks.push(spawn_heartbeat(self.config.clone(), shutdown_rx));

        Ok(DaemonHandle {
            view,
            dispatcher,
            shutdown: shutdown_tx,
            tasks,
        })
    }
}

/// Periodic liveness log. The daemon schedules no other work.
fn spawn_heartbeat(config: DaemonConfig, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.heartbeat_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => info!(app = %config.app_name, server = %config.server_name, "live"),
                _ = shutdown.changed() => return,
            }
        }
    })
}

/// Handle to a running daemon.
pub struct DaemonHandle {
    view: LocalView,
    dispatcher: Arc<WatchDispatcher>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl DaemonHandle {
    /// In-process view of the latest rendered values.
    pub fn view(&self) -> LocalView {
        self.view.clone()
    }

    /// Lifecycle state of one watched path.
    pub fn state_of(&self, path: &str) -> Option<WatchState> {
        self.dispatcher.state_of(path)
    }

    /// Block until every watch task ends.
    ///
    /// In normal operation that is never — watches are held for the process
    /// lifetime — so this is the daemon's idle foreground path.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }

    /// Gracefully stop the daemon.
    ///
    /// Tasks suspended in the registered wait exit immediately; a task in
    /// the middle of handling finishes its current cycle (render and write
    /// complete) before exiting, so no artifact is left half-produced.
    pub async fn shutdown(self) {
        info!("shutdown requested");
        let _ = self.shutdown.send(true);
        for task in self.tasks {
            let _ = task.await;
        }
        info!("all watch tasks drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> DaemonConfig {
        DaemonConfig::builder()
            .with_app_name("app")
            .with_server_name("s1")
            .with_artifact_dir(dir.path())
            .with_heartbeat_interval(Duration::from_secs(3600))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn start_registers_all_paths() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let handle = Daemon::new(test_config(&dir), Arc::new(store.clone()))
            .start()
            .await
            .unwrap();

        assert_eq!(
            handle.state_of("/app/s1/conf/maintenanceWindow"),
            Some(WatchState::Registered)
        );
        assert!(store.has_pending_watch("/app/s1/conf/allowList"));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn invalid_identity_aborts_startup() {
        let dir = TempDir::new().unwrap();
        let config = DaemonConfig::builder()
            .with_app_name("app/bad")
            .with_server_name("s1")
            .with_artifact_dir(dir.path())
            .build()
            .unwrap();

        let result = Daemon::new(config, Arc::new(MemoryStore::new())).start().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn shutdown_drains_watch_tasks() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::new();
        let handle = Daemon::new(test_config(&dir), Arc::new(store.clone()))
            .start()
            .await
            .unwrap();

        // Must complete promptly even with all paths idle in their wait.
        tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .unwrap();
    }
}
