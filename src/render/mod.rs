//! Renderers that turn raw store values into local artifact content.
//!
//! One renderer per configuration key. Renderers are pure: bytes in,
//! complete artifact text out, no I/O. Every artifact is independently
//! loadable — a reader never needs the previous version of the file to
//! interpret the new one.

mod maintenance;
mod roster;

pub use maintenance::render_maintenance_window;
pub use roster::render_roster;

use crate::error::{MirrorError, Result};
use crate::registry::HandlerKind;
use serde_json::Value;

/// Fully formed content for one local artifact file.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedArtifact {
    /// File name the artifact should land under (relative to the artifact
    /// directory).
    pub file_name: &'static str,
    /// Complete file content.
    pub content: String,
    /// The same artifact as a structured document, for in-process readers.
    pub document: Value,
}

/// Render a raw store value with the handler registered for its path.
///
/// # Errors
///
/// Returns [`MirrorError::Render`](crate::error::MirrorError::Render) if the
/// value does not parse into the shape the handler expects. The caller skips
/// the write for this cycle and keeps the previous artifact in place.
pub fn render(handler: HandlerKind, path: &str, raw: &[u8]) -> Result<RenderedArtifact> {
    let document = match handler {
        HandlerKind::MaintenanceWindow => render_maintenance_window(path, raw)?,
        HandlerKind::AllowList => render_roster(path, raw, "allow_list")?,
        HandlerKind::DenyList => render_roster(path, raw, "deny_list")?,
    };

    let content = serde_json::to_string_pretty(&document)
        .map_err(|e| MirrorError::render(path, format!("failed to serialize artifact: {}", e)))?;

    Ok(RenderedArtifact {
        file_name: handler.artifact_name(),
        content,
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_to_the_registered_renderer() {
        let artifact = render(
            HandlerKind::MaintenanceWindow,
            "/app/s1/conf/maintenanceWindow",
            br#"["2023-01-01T00:00", "2023-01-02T00:00"]"#,
        )
        .unwrap();
        assert_eq!(artifact.file_name, "maintenance_window.json");
        assert!(artifact.content.contains("maintenance_start"));

        let artifact = render(
            HandlerKind::AllowList,
            "/app/s1/conf/allowList",
            br#"["uuid-1"]"#,
        )
        .unwrap();
        assert_eq!(artifact.file_name, "allow_list.json");
        assert!(artifact.content.contains("allow_list"));

        let artifact = render(
            HandlerKind::DenyList,
            "/app/s1/conf/denyList",
            br#"["uuid-1"]"#,
        )
        .unwrap();
        assert_eq!(artifact.file_name, "deny_list.json");
        assert!(artifact.content.contains("deny_list"));
    }

    #[test]
    fn artifact_content_is_loadable_json() {
        let artifact = render(
            HandlerKind::AllowList,
            "/app/s1/conf/allowList",
            br#"["a", "b"]"#,
        )
        .unwrap();
        let parsed: Value = serde_json::from_str(&artifact.content).unwrap();
        assert!(parsed.is_object());
    }

    #[test]
    fn content_and_document_agree() {
        let artifact = render(
            HandlerKind::DenyList,
            "/app/s1/conf/denyList",
            br#"["a"]"#,
        )
        .unwrap();
        let reparsed: Value = serde_json::from_str(&artifact.content).unwrap();
        assert_eq!(reparsed, artifact.document);
    }
}
