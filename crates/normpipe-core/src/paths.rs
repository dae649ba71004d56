//! Dotted-path addressing over nested JSON structures
//!
//! Every plugin reaches into events through these helpers rather than
//! hand-walking maps. Paths are dot-separated ("details.sourceipaddress",
//! "details.events.0.name"); numeric segments index into arrays. There is
//! no escaping for literal dots in key names - a key containing a dot is
//! addressed as if it were a nested path. Known limitation.

use serde_json::{Map, Value};

/// Get a value at a dotted path. Missing intermediate keys or indexes
/// resolve to `None`; this never fails.
pub fn get<'a>(container: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = container;

    for segment in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(segment)?;
            }
            Value::Array(arr) => {
                // support array indexing: "details.events.0.name"
                if let Ok(idx) = segment.parse::<usize>() {
                    current = arr.get(idx)?;
                } else {
                    return None;
                }
            }
            _ => return None,
        }
    }

    Some(current)
}

/// [`get`] rooted at a mapping instead of a wrapped value.
pub fn get_in<'a>(container: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((first, rest)) => get(container.get(first)?, rest),
        None => container.get(path),
    }
}

/// Set a value at a dotted path, creating intermediate mappings as needed.
/// An intermediate segment holding a non-mapping value is replaced by a
/// mapping so the write always lands.
pub fn set(container: &mut Map<String, Value>, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = container;

    for segment in &segments[..segments.len() - 1] {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }

    if let Some(last) = segments.last() {
        current.insert(last.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_value_by_path() {
        let v = json!({"key": "value"});
        assert_eq!(get(&v, "key"), Some(&json!("value")));

        let v = json!({"key": {"key": "value"}});
        assert_eq!(get(&v, "key.key"), Some(&json!("value")));

        let v = json!({"key": {"key": {"key": "value"}}});
        assert_eq!(get(&v, "key.key.key"), Some(&json!("value")));
    }

    #[test]
    fn test_get_missing_is_absent() {
        let v = json!({"key": "value"});
        assert_eq!(get(&v, "nope"), None);
        assert_eq!(get(&v, "key.deeper"), None);
        assert_eq!(get(&v, "nope.deeper.still"), None);
    }

    #[test]
    fn test_get_array_index() {
        let v = json!({"events": [{"name": "login"}, {"name": "logout"}]});
        assert_eq!(get(&v, "events.0.name"), Some(&json!("login")));
        assert_eq!(get(&v, "events.1.name"), Some(&json!("logout")));
        assert_eq!(get(&v, "events.2.name"), None);
        assert_eq!(get(&v, "events.first.name"), None);
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut map = Map::new();
        set(&mut map, "details.sourceipaddress", json!("10.1.1.1"));
        let v = Value::Object(map);
        assert_eq!(get(&v, "details.sourceipaddress"), Some(&json!("10.1.1.1")));
    }

    #[test]
    fn test_set_overwrites_existing() {
        let mut map = match json!({"details": {"some": "thing"}}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        set(&mut map, "details.some", json!("other"));
        let v = Value::Object(map);
        assert_eq!(get(&v, "details.some"), Some(&json!("other")));
    }

    #[test]
    fn test_set_replaces_scalar_intermediate() {
        let mut map = match json!({"details": "not a map"}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        set(&mut map, "details.ip", json!("10.0.0.1"));
        let v = Value::Object(map);
        assert_eq!(get(&v, "details.ip"), Some(&json!("10.0.0.1")));
    }

    #[test]
    fn test_get_in_roots_at_map() {
        let map = match json!({"details": {"id": {"time": "t"}}, "top": 1}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        assert_eq!(get_in(&map, "details.id.time"), Some(&json!("t")));
        assert_eq!(get_in(&map, "top"), Some(&json!(1)));
        assert_eq!(get_in(&map, "details.missing"), None);
        assert_eq!(get_in(&map, "absent.path"), None);
    }
}
