//! Daemon configuration: builder and environment bootstrap.

use crate::dispatch::RearmPolicy;
use crate::error::{MirrorError, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_HEARTBEAT_SECS: u64 = 60;

/// Settings the daemon needs at startup.
///
/// Identity (`app_name`, `server_name`) namespaces every watched path;
/// `artifact_dir` is where rendered files land. Store host/port are carried
/// for whoever constructs the store client — the daemon itself receives an
/// already-connected handle.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Application name, first path segment.
    pub app_name: String,
    /// Server/instance name, second path segment.
    pub server_name: String,
    /// Directory rendered artifact files are written to.
    pub artifact_dir: PathBuf,
    /// Interval between liveness log lines.
    pub heartbeat_interval: Duration,
    /// Backoff policy for watch re-registration.
    pub rearm: RearmPolicy,
    /// Coordination-store host, if bootstrap provided one.
    pub store_host: Option<String>,
    /// Coordination-store port, if bootstrap provided one.
    pub store_port: Option<u16>,
}

impl DaemonConfig {
    /// Start building a configuration.
    pub fn builder() -> DaemonConfigBuilder {
        DaemonConfigBuilder::new()
    }

    /// Read configuration from `CONFMIRROR_`-prefixed environment variables.
    ///
    /// Recognized variables: `CONFMIRROR_APP_NAME`, `CONFMIRROR_SERVER_NAME`,
    /// `CONFMIRROR_ARTIFACT_DIR` (all required), `CONFMIRROR_HEARTBEAT_SECS`,
    /// `CONFMIRROR_STORE_HOST`, `CONFMIRROR_STORE_PORT` (optional).
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Identity`] if a required variable is missing
    /// or a value fails to parse.
    pub fn from_env() -> Result<Self> {
        #[derive(Deserialize)]
        struct RawEnv {
            app_name: String,
            server_name: String,
            artifact_dir: String,
            heartbeat_secs: Option<u64>,
            store_host: Option<String>,
            store_port: Option<u16>,
        }

        let raw: RawEnv = config::Config::builder()
            .add_source(config::Environment::with_prefix("CONFMIRROR").try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| MirrorError::Identity(format!("environment bootstrap failed: {}", e)))?;

        DaemonConfigBuilder {
            app_name: Some(raw.app_name),
            server_name: Some(raw.server_name),
            artifact_dir: Some(PathBuf::from(raw.artifact_dir)),
            heartbeat_interval: Duration::from_secs(
                raw.heartbeat_secs.unwrap_or(DEFAULT_HEARTBEAT_SECS),
            ),
            rearm: RearmPolicy::default(),
            store_host: raw.store_host,
            store_port: raw.store_port,
        }
        .build()
    }
}

/// Builder for [`DaemonConfig`].
///
/// # Examples
///
/// ```rust
/// use confmirror::daemon::DaemonConfig;
///
/// let config = DaemonConfig::builder()
///     .with_app_name("mygame")
///     .with_server_name("server-3")
///     .with_artifact_dir("/var/lib/mygame/conf")
///     .build()
///     .unwrap();
/// assert_eq!(config.heartbeat_interval.as_secs(), 60);
/// ```
pub struct DaemonConfigBuilder {
    pub(crate) app_name: Option<String>,
    pub(crate) server_name: Option<String>,
    pub(crate) artifact_dir: Option<PathBuf>,
    pub(crate) heartbeat_interval: Duration,
    pub(crate) rearm: RearmPolicy,
    pub(crate) store_host: Option<String>,
    pub(crate) store_port: Option<u16>,
}

impl DaemonConfigBuilder {
    /// Create a builder with default intervals and no identity.
    pub fn new() -> Self {
        Self {
            app_name: None,
            server_name: None,
            artifact_dir: None,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            rearm: RearmPolicy::default(),
            store_host: None,
            store_port: None,
        }
    }

    /// Set the application name.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the server/instance name.
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Set the artifact output directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = Some(dir.into());
        self
    }

    /// Set the heartbeat interval (default 60s).
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the re-registration backoff policy.
    pub fn with_rearm_policy(mut self, rearm: RearmPolicy) -> Self {
        self.rearm = rearm;
        self
    }

    /// Record the store endpoint for whoever builds the client.
    pub fn with_store_endpoint(mut self, host: impl Into<String>, port: u16) -> Self {
        self.store_host = Some(host.into());
        self.store_port = Some(port);
        self
    }

    /// Finalize the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Identity`] if the application name, server
    /// name, or artifact directory is missing.
    pub fn build(self) -> Result<DaemonConfig> {
        let app_name = self
            .app_name
            .ok_or_else(|| MirrorError::Identity("application name is required".to_string()))?;
        let server_name = self
            .server_name
            .ok_or_else(|| MirrorError::Identity("server name is required".to_string()))?;
        let artifact_dir = self
            .artifact_dir
            .ok_or_else(|| MirrorError::Identity("artifact directory is required".to_string()))?;

        Ok(DaemonConfig {
            app_name,
            server_name,
            artifact_dir,
            heartbeat_interval: self.heartbeat_interval,
            rearm: self.rearm,
            store_host: self.store_host,
            store_port: self.store_port,
        })
    }
}

impl Default for DaemonConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(unsafe_code)] // For env var manipulation in tests
mod tests {
    use super::*;
    use std::env;

    // One test owns every CONFMIRROR_* variable; splitting it up would let
    // parallel test threads race on the process environment.
    #[test]
    fn from_env_reads_bootstrap_variables() {
        unsafe {
            env::set_var("CONFMIRROR_APP_NAME", "xgame");
            env::set_var("CONFMIRROR_SERVER_NAME", "biz01");
            env::set_var("CONFMIRROR_ARTIFACT_DIR", "/var/lib/xgame/conf");
            env::set_var("CONFMIRROR_HEARTBEAT_SECS", "15");
            env::set_var("CONFMIRROR_STORE_HOST", "zk.internal");
            env::set_var("CONFMIRROR_STORE_PORT", "2181");
        }

        let config = DaemonConfig::from_env().unwrap();
        assert_eq!(config.app_name, "xgame");
        assert_eq!(config.server_name, "biz01");
        assert_eq!(config.artifact_dir, PathBuf::from("/var/lib/xgame/conf"));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(config.store_host.as_deref(), Some("zk.internal"));
        assert_eq!(config.store_port, Some(2181));

        // Optional variables fall back to their defaults.
        unsafe {
            env::remove_var("CONFMIRROR_HEARTBEAT_SECS");
            env::remove_var("CONFMIRROR_STORE_HOST");
            env::remove_var("CONFMIRROR_STORE_PORT");
        }
        let config = DaemonConfig::from_env().unwrap();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert!(config.store_host.is_none());
        assert!(config.store_port.is_none());

        // A missing required variable is a bootstrap error.
        unsafe {
            env::remove_var("CONFMIRROR_SERVER_NAME");
        }
        let err = DaemonConfig::from_env().unwrap_err();
        assert!(matches!(err, MirrorError::Identity(_)));

        unsafe {
            env::remove_var("CONFMIRROR_APP_NAME");
            env::remove_var("CONFMIRROR_ARTIFACT_DIR");
        }
    }

    #[test]
    fn builder_requires_identity_and_dir() {
        assert!(DaemonConfig::builder().build().is_err());
        assert!(
            DaemonConfig::builder()
                .with_app_name("app")
                .with_server_name("s1")
                .build()
                .is_err()
        );
    }

    #[test]
    fn builder_applies_defaults() {
        let config = DaemonConfig::builder()
            .with_app_name("app")
            .with_server_name("s1")
            .with_artifact_dir("/tmp/conf")
            .build()
            .unwrap();

        assert_eq!(config.heartbeat_interval, Duration::from_secs(60));
        assert!(config.store_host.is_none());
    }

    #[test]
    fn builder_records_store_endpoint() {
        let config = DaemonConfig::builder()
            .with_app_name("app")
            .with_server_name("s1")
            .with_artifact_dir("/tmp/conf")
            .with_store_endpoint("zk.internal", 2181)
            .build()
            .unwrap();

        assert_eq!(config.store_host.as_deref(), Some("zk.internal"));
        assert_eq!(config.store_port, Some(2181));
    }
}
