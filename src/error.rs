//! Error types for confmirror.

/// Result type alias for confmirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Errors that can occur while mirroring configuration.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// The coordination store could not be reached.
    ///
    /// Fatal when raised during startup registration; during re-arm it is
    /// retried with backoff before the affected path is given up on.
    #[error("Coordination store unreachable: {0}")]
    Connection(String),

    /// A notification arrived for a path that is not in the registry.
    #[error("No handler registered for path '{path}'")]
    Routing {
        /// The unrecognized store path.
        path: String,
    },

    /// A fetched value failed to parse into the shape its renderer expects.
    #[error("Failed to render value for '{path}': {reason}")]
    Render {
        /// The store path whose value was malformed.
        path: String,
        /// Why parsing failed.
        reason: String,
    },

    /// Writing or atomically placing an artifact file failed.
    #[error("Failed to write artifact '{target}': {source}")]
    Write {
        /// The artifact file that could not be replaced.
        target: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// Malformed process identity (application or server name).
    #[error("Invalid identity: {0}")]
    Identity(String),
}

impl MirrorError {
    /// Create a render error for a given path.
    pub fn render(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Render {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is contained to a single handling cycle.
    ///
    /// Contained errors are logged and the watch is re-armed; anything else
    /// stops observation of the path (or, at startup, aborts the daemon).
    pub fn is_contained(&self) -> bool {
        matches!(
            self,
            Self::Routing { .. } | Self::Render { .. } | Self::Write { .. }
        )
    }
}
