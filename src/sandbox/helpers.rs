//! The two helper functions templates are allowed to call.
//!
//! This is the entire global namespace of the sandbox. Anything else a
//! template references is undefined and fails the render.

use std::collections::BTreeMap;

use minijinja::value::Value;

use super::policy::GuardedMap;

/// Museum metadata exposed through `museum_meta()`.
const MUSEUM_META: &[(&str, MetaValue)] = &[
    ("name", MetaValue::Str("The Template Museum")),
    ("founded", MetaValue::Str("2024")),
    ("collection_size", MetaValue::Int(137)),
    ("type", MetaValue::Str("Digital Art Gallery")),
];

/// A metadata value: the table holds strings and counts only.
enum MetaValue {
    Str(&'static str),
    Int(i64),
}

fn meta_map() -> BTreeMap<String, Value> {
    MUSEUM_META
        .iter()
        .map(|(key, value)| {
            let value = match value {
                MetaValue::Str(s) => Value::from(*s),
                MetaValue::Int(n) => Value::from(*n),
            };
            ((*key).to_owned(), value)
        })
        .collect()
}

/// Whitelisted helper: look up museum metadata.
///
/// With a key, returns the matching entry or `"Unknown"`. Without a key,
/// returns the whole metadata map, attribute-gated like everything else the
/// sandbox exposes.
pub fn museum_meta(key: Option<String>) -> Value {
    let map = meta_map();
    match key {
        Some(key) => map.get(&key).cloned().unwrap_or_else(|| Value::from("Unknown")),
        None => Value::from_object(GuardedMap::new(map)),
    }
}

/// Whitelisted helper: the curator's welcome note.
pub fn curator_note() -> String {
    "Welcome to our digital collection! This museum showcases the finest templates.".to_owned()
}
