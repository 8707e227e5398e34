//! Maintenance-window renderer.

use crate::error::{MirrorError, Result};
use serde_json::{Value, json};

/// Render the maintenance-window document from a raw store value.
///
/// The raw value must be a JSON array of exactly two strings, the start and
/// end markers of the window. The document defines the two as named scalar
/// settings.
///
/// # Errors
///
/// Returns a render error if the value is not valid JSON, is not an array of
/// strings, or has the wrong arity.
pub fn render_maintenance_window(path: &str, raw: &[u8]) -> Result<Value> {
    let markers: Vec<String> = serde_json::from_slice(raw)
        .map_err(|e| MirrorError::render(path, format!("expected an array of strings: {}", e)))?;

    let [start, end] = markers.as_slice() else {
        return Err(MirrorError::render(
            path,
            format!("expected exactly 2 markers, got {}", markers.len()),
        ));
    };

    Ok(json!({
        "maintenance_start": start,
        "maintenance_end": end,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/app/s1/conf/maintenanceWindow";

    #[test]
    fn renders_start_and_end() {
        let document =
            render_maintenance_window(PATH, br#"["2023-01-01T00:00", "2023-01-02T00:00"]"#)
                .unwrap();

        assert_eq!(document["maintenance_start"], "2023-01-01T00:00");
        assert_eq!(document["maintenance_end"], "2023-01-02T00:00");
    }

    #[test]
    fn rejects_wrong_arity() {
        assert!(render_maintenance_window(PATH, br#"["only-one"]"#).is_err());
        assert!(render_maintenance_window(PATH, br#"["a", "b", "c"]"#).is_err());
        assert!(render_maintenance_window(PATH, b"[]").is_err());
    }

    #[test]
    fn rejects_non_array() {
        assert!(render_maintenance_window(PATH, br#"{"start": "x"}"#).is_err());
        assert!(render_maintenance_window(PATH, b"not json at all").is_err());
    }
}
