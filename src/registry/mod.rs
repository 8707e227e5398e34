//! The static mapping from store paths to handlers.
//!
//! A mirror instance is responsible for a fixed set of remote configuration
//! keys, namespaced by its application and server identity. The registry is
//! built once at startup and never changes afterwards, so lookups need no
//! synchronization.

use crate::error::{MirrorError, Result};
use std::collections::HashMap;

/// The closed set of configuration handlers this service knows about.
///
/// Each variant names one remote configuration key and the renderer that
/// turns its value into a local artifact. Dispatch over this enum is
/// exhaustive at compile time, so adding a key here forces every match site
/// to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Service maintenance window: a (start, end) pair of time markers.
    MaintenanceWindow,
    /// Identifiers allowed in regardless of other gating.
    AllowList,
    /// Identifiers refused entry.
    DenyList,
}

impl HandlerKind {
    /// All handler kinds, in registration order.
    pub const ALL: [HandlerKind; 3] = [
        HandlerKind::MaintenanceWindow,
        HandlerKind::AllowList,
        HandlerKind::DenyList,
    ];

    /// The remote configuration key under `.../conf/`.
    pub fn config_key(self) -> &'static str {
        match self {
            HandlerKind::MaintenanceWindow => "maintenanceWindow",
            HandlerKind::AllowList => "allowList",
            HandlerKind::DenyList => "denyList",
        }
    }

    /// File name of the local artifact this handler produces.
    pub fn artifact_name(self) -> &'static str {
        match self {
            HandlerKind::MaintenanceWindow => "maintenance_window.json",
            HandlerKind::AllowList => "allow_list.json",
            HandlerKind::DenyList => "deny_list.json",
        }
    }
}

/// A single remote key this instance watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedPath {
    /// Full hierarchical store path.
    pub path: String,
    /// The handler responsible for values at this path.
    pub handler: HandlerKind,
}

/// Immutable mapping from store path to handler.
///
/// Built once from the instance identity; every path this service watches
/// for the life of the process comes from here.
///
/// # Examples
///
/// ```rust
/// use confmirror::registry::{HandlerKind, PathRegistry};
///
/// let registry = PathRegistry::build("mygame", "server-3").unwrap();
/// assert_eq!(registry.len(), 3);
/// assert_eq!(
///     registry.resolve("/mygame/server-3/conf/allowList"),
///     Some(HandlerKind::AllowList),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct PathRegistry {
    entries: HashMap<String, HandlerKind>,
}

impl PathRegistry {
    /// Build the registry for one application/server identity.
    ///
    /// Pure and deterministic: no I/O, same inputs always produce the same
    /// path set. Paths have the form `/{app_name}/{server_name}/conf/{key}`.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::Identity`] if either name is empty or contains
    /// a path separator; a malformed identity means the instance cannot know
    /// which keys it owns, so startup must abort.
    pub fn build(app_name: &str, server_name: &str) -> Result<Self> {
        validate_identity("application name", app_name)?;
        validate_identity("server name", server_name)?;

        let entries = HandlerKind::ALL
            .iter()
            .map(|&handler| {
                (
                    format!(
                        "/{}/{}/conf/{}",
                        app_name,
                        server_name,
                        handler.config_key()
                    ),
                    handler,
                )
            })
            .collect();

        Ok(Self { entries })
    }

    /// Look up the handler for a store path.
    ///
    /// `None` means the path is not one of ours; the dispatcher treats that
    /// as a routing error and drops the notification.
    pub fn resolve(&self, path: &str) -> Option<HandlerKind> {
        self.entries.get(path).copied()
    }

    /// Iterate over every watched path.
    pub fn watched_paths(&self) -> impl Iterator<Item = WatchedPath> + '_ {
        self.entries.iter().map(|(path, &handler)| WatchedPath {
            path: path.clone(),
            handler,
        })
    }

    /// Number of watched paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty (never true for a built registry).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn validate_identity(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(MirrorError::Identity(format!("{} is empty", what)));
    }
    if value.contains('/') {
        return Err(MirrorError::Identity(format!(
            "{} '{}' contains a path separator",
            what, value
        )));
    }
    Ok(())
}
