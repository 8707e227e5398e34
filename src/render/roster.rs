//! Allow-list / deny-list renderer.
//!
//! Both lists share one shape: a set of opaque identifiers. The document maps
//! each identifier to `true` so readers get O(1) membership checks by key
//! lookup instead of scanning an array.

use crate::error::{MirrorError, Result};
use serde_json::{Map, Value};

/// Render a membership-set document from a raw store value.
///
/// The raw value must be a JSON array of identifier strings. The document is
/// a single named object keyed by identifier; duplicates collapse.
///
/// # Errors
///
/// Returns a render error if the value is not a JSON array of strings.
pub fn render_roster(path: &str, raw: &[u8], setting_name: &str) -> Result<Value> {
    let ids: Vec<String> = serde_json::from_slice(raw)
        .map_err(|e| MirrorError::render(path, format!("expected an array of strings: {}", e)))?;

    let members: Map<String, Value> = ids.into_iter().map(|id| (id, Value::Bool(true))).collect();

    let mut document = Map::new();
    document.insert(setting_name.to_string(), Value::Object(members));
    Ok(Value::Object(document))
}
