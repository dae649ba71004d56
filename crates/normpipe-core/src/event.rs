//! The canonical event shape.
//!
//! An event is an ordinary JSON object all the way through the pipeline.
//! Normalization pushes every record toward the same top-level shell, with
//! source-specific payload living under `details`.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::walk;

/// A pipeline event: a mutable JSON object.
pub type Event = Map<String, Value>;

/// Top-level fields of the canonical shell. Anything else at the top level
/// belongs under `details`.
pub const SHELL_KEYS: [&str; 8] = [
    "utctimestamp",
    "severity",
    "summary",
    "category",
    "source",
    "tags",
    "plugins",
    "details",
];

/// Whether a top-level key is part of the canonical shell.
pub fn is_shell_key(key: &str) -> bool {
    SHELL_KEYS.contains(&key)
}

/// The tokens an event offers for plugin matching: every key at any depth,
/// every string tag, and the category value, all lowercased.
///
/// Events mutate as plugins run, so callers recompute this before each
/// criteria check rather than caching it.
pub fn criteria_tokens(event: &Event) -> HashSet<String> {
    let mut tokens = HashSet::new();
    for key in walk::map_keys(event) {
        tokens.insert(key.to_lowercase());
    }
    if let Some(Value::Array(tags)) = event.get("tags") {
        for tag in tags {
            if let Value::String(tag) = tag {
                tokens.insert(tag.to_lowercase());
            }
        }
    }
    if let Some(Value::String(category)) = event.get("category") {
        tokens.insert(category.to_lowercase());
    }
    tokens
}

/// Append a plugin name to the event's `plugins` list, creating the list if
/// it is missing. A non-list value under `plugins` is replaced.
pub fn record_plugin(event: &mut Event, name: &str) {
    match event.get_mut("plugins") {
        Some(Value::Array(list)) => list.push(Value::String(name.to_string())),
        _ => {
            event.insert(
                "plugins".to_string(),
                Value::Array(vec![Value::String(name.to_string())]),
            );
        }
    }
}
