//! Fact map normalization
//!
//! Reported facts arrive as arbitrary JSON. Before diffing, every key and
//! value is flattened to a string and blank entries are dropped.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Flat fact name to fact value mapping
pub type NormalizedFacts = BTreeMap<String, String>;

/// Normalize a JSON object of facts
///
/// Entries with a blank key or a blank value after coercion are dropped.
pub fn normalize(raw: &Map<String, Value>) -> NormalizedFacts {
    raw.iter()
        .filter_map(|(name, value)| {
            let value = value_to_string(value);
            if name.trim().is_empty() || value.trim().is_empty() {
                None
            } else {
                Some((name.clone(), value))
            }
        })
        .collect()
}

/// String representation of one fact value
///
/// Strings are taken verbatim, null becomes empty, scalars use their display
/// form and structures are kept as compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
