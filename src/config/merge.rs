//! Layer merging for the application configuration.
//!
//! Tables merge key by key, every other value (lists included) is taken
//! whole from the higher layer.

use serde_json::{Map, Value};

/// Lay `layer` over `base` in place.
pub fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(table), Value::Object(upper)) => merge_tables(table, upper),
        (slot, value) => *slot = value,
    }
}

fn merge_tables(table: &mut Map<String, Value>, upper: Map<String, Value>) {
    for (key, value) in upper {
        match table.get_mut(&key) {
            Some(existing) => overlay(existing, value),
            None => {
                table.insert(key, value);
            }
        }
    }
}

/// Fold layers lowest precedence first.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for layer in layers {
        overlay(&mut merged, layer);
    }
    merged
}
