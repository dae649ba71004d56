//! Recursive traversal over nested JSON structures
//!
//! Lazy depth-first enumeration of keys and leaf values, recursive key
//! search, deep merge, and flat projections. These back the discovery
//! plugins (scanning arbitrarily-shaped events for candidate fields) and
//! the shell normalizer (merging defaults under an event).

use std::collections::HashSet;

use crate::paths;
use serde_json::{Map, Value};

enum Frame<'a> {
    Map(serde_json::map::Iter<'a>),
    Array(std::slice::Iter<'a, Value>),
}

impl<'a> Frame<'a> {
    fn for_value(value: &'a Value) -> Option<Frame<'a>> {
        match value {
            Value::Object(map) => Some(Frame::Map(map.iter())),
            Value::Array(arr) => Some(Frame::Array(arr.iter())),
            _ => None,
        }
    }
}

/// Lazy depth-first iterator over every mapping key under a node.
/// See [`enumerate_keys`].
pub struct Keys<'a> {
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(mut frame) = self.stack.pop() {
            match &mut frame {
                Frame::Map(entries) => {
                    if let Some((key, value)) = entries.next() {
                        // keep walking this mapping after the subtree
                        self.stack.push(frame);
                        if let Some(child) = Frame::for_value(value) {
                            self.stack.push(child);
                        }
                        return Some(key.as_str());
                    }
                }
                Frame::Array(items) => {
                    if let Some(value) = items.next() {
                        self.stack.push(frame);
                        if let Some(child) = Frame::for_value(value) {
                            self.stack.push(child);
                        }
                    }
                }
            }
        }
        None
    }
}

/// Every mapping key found anywhere under `node`, depth-first, duplicates
/// included. Lists are visited element-wise; scalars yield nothing.
pub fn enumerate_keys(node: &Value) -> Keys<'_> {
    Keys {
        stack: Frame::for_value(node).into_iter().collect(),
    }
}

/// Lazy depth-first iterator over leaf values. See [`enumerate_values`].
pub struct Leaves<'a> {
    root: Option<&'a Value>,
    stack: Vec<Frame<'a>>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            return Some(root);
        }
        while let Some(mut frame) = self.stack.pop() {
            let value = match &mut frame {
                Frame::Map(entries) => entries.next().map(|(_, v)| v),
                Frame::Array(items) => items.next(),
            };
            if let Some(value) = value {
                self.stack.push(frame);
                match Frame::for_value(value) {
                    Some(child) => self.stack.push(child),
                    None => return Some(value),
                }
            }
        }
        None
    }
}

/// Every leaf (non-mapping, non-list) value found anywhere under `node`,
/// depth-first. A scalar node yields itself once.
pub fn enumerate_values(node: &Value) -> Leaves<'_> {
    match Frame::for_value(node) {
        Some(frame) => Leaves {
            root: None,
            stack: vec![frame],
        },
        None => Leaves {
            root: Some(node),
            stack: Vec::new(),
        },
    }
}

enum FindFrame<'a> {
    Map {
        matched: Option<&'a Value>,
        children: serde_json::map::Values<'a>,
    },
    Array(std::slice::Iter<'a, Value>),
}

fn find_frame<'a>(value: &'a Value, key: &str) -> Option<FindFrame<'a>> {
    match value {
        Value::Object(map) => Some(FindFrame::Map {
            matched: map.get(key),
            children: map.values(),
        }),
        Value::Array(arr) => Some(FindFrame::Array(arr.iter())),
        _ => None,
    }
}

/// Lazy iterator over every value stored under a given key. See
/// [`find_all`].
pub struct FindAll<'a> {
    key: String,
    stack: Vec<FindFrame<'a>>,
}

impl<'a> Iterator for FindAll<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(mut frame) = self.stack.pop() {
            match &mut frame {
                FindFrame::Map { matched, children } => {
                    // a mapping's own match comes before its children
                    if let Some(value) = matched.take() {
                        self.stack.push(frame);
                        return Some(value);
                    }
                    if let Some(child) = children.next() {
                        self.stack.push(frame);
                        if let Some(child_frame) = find_frame(child, &self.key) {
                            self.stack.push(child_frame);
                        }
                    }
                }
                FindFrame::Array(items) => {
                    if let Some(item) = items.next() {
                        self.stack.push(frame);
                        if let Some(child_frame) = find_frame(item, &self.key) {
                            self.stack.push(child_frame);
                        }
                    }
                }
            }
        }
        None
    }
}

/// For every mapping anywhere under `node` that contains `key`, yields its
/// value. Depth-first, pre-order: a mapping's own match is yielded before
/// its children are searched.
pub fn find_all<'a>(node: &'a Value, key: &str) -> FindAll<'a> {
    FindAll {
        stack: find_frame(node, key).into_iter().collect(),
        key: key.to_string(),
    }
}

/// Every key at any depth of a mapping, the top level included.
pub fn map_keys(map: &Map<String, Value>) -> HashSet<&str> {
    let mut keys = HashSet::new();
    for (key, value) in map {
        keys.insert(key.as_str());
        for nested in enumerate_keys(value) {
            keys.insert(nested);
        }
    }
    keys
}

/// Every value stored under `key` anywhere in `map`, the map's own entry
/// first. [`find_all`] for a bare mapping root.
pub fn find_in_map<'a>(map: &'a Map<String, Value>, key: &str) -> Vec<&'a Value> {
    let mut found = Vec::new();
    if let Some(value) = map.get(key) {
        found.push(value);
    }
    for value in map.values() {
        found.extend(find_all(value, key));
    }
    found
}

/// Recursive merge of two values. Where a key holds a mapping on both
/// sides the mappings merge recursively; everywhere else the overlay's
/// value wins. Returns a new value, inputs are untouched.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut result = base_map.clone();
            for (key, value) in overlay_map {
                let merged = match result.get(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => value.clone(),
                };
                result.insert(key.clone(), merged);
            }
            Value::Object(result)
        }
        _ => overlay.clone(),
    }
}

/// Project path-like keys out of `source` into a flat mapping. Dotted
/// paths resolve through nested structure; a path that resolves to absent
/// takes `default`.
pub fn submap<I, S>(source: &Value, keys: I, default: &Value) -> Map<String, Value>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = Map::new();
    for key in keys {
        let key = key.as_ref();
        let value = paths::get(source, key)
            .cloned()
            .unwrap_or_else(|| default.clone());
        result.insert(key.to_string(), value);
    }
    result
}

/// True iff `target` contains every key of `query` with exactly the
/// query's values. Query keys may be dotted paths into the target.
pub fn structural_match(query: &Value, target: &Value) -> bool {
    let keys: Vec<String> = enumerate_keys(query).map(str::to_string).collect();
    Value::Object(submap(target, &keys, &Value::Null)) == *query
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complex_fixture() -> Value {
        json!({
            "some_key": "some value",
            "sub_key": {"some_key": "some other value"},
        })
    }

    #[test]
    fn test_enum_keys() {
        let node = complex_fixture();
        let result: Vec<&str> = enumerate_keys(&node).collect();
        assert_eq!(result, vec!["some_key", "sub_key", "some_key"]);
    }

    #[test]
    fn test_enum_keys_through_lists() {
        let node = json!({"list": [{"k1": 1}, {"k2": 2}], "z": 3});
        let result: Vec<&str> = enumerate_keys(&node).collect();
        assert_eq!(result, vec!["list", "k1", "k2", "z"]);
    }

    #[test]
    fn test_enum_keys_scalar_is_empty() {
        assert_eq!(enumerate_keys(&json!("flat")).count(), 0);
        assert_eq!(enumerate_keys(&json!(42)).count(), 0);
    }

    #[test]
    fn test_enum_values() {
        let node = complex_fixture();
        let result: Vec<&Value> = enumerate_values(&node).collect();
        assert_eq!(result, vec![&json!("some value"), &json!("some other value")]);
    }

    #[test]
    fn test_enum_values_scalar_yields_itself() {
        let node = json!(42);
        let result: Vec<&Value> = enumerate_values(&node).collect();
        assert_eq!(result, vec![&json!(42)]);
    }

    #[test]
    fn test_find_keys() {
        let node = complex_fixture();
        let result: Vec<&Value> = find_all(&node, "some_key").collect();
        assert_eq!(result, vec![&json!("some value"), &json!("some other value")]);
    }

    #[test]
    fn test_find_keys_own_match_before_children() {
        let node = json!({
            "a": {"target": "nested"},
            "target": "own",
        });
        let result: Vec<&Value> = find_all(&node, "target").collect();
        assert_eq!(result, vec![&json!("own"), &json!("nested")]);
    }

    #[test]
    fn test_find_keys_inside_lists() {
        let node = json!({"events": [{"name": "one"}, {"name": "two"}]});
        let result: Vec<&Value> = find_all(&node, "name").collect();
        assert_eq!(result, vec![&json!("one"), &json!("two")]);
    }

    #[test]
    fn test_map_keys_snapshot() {
        let map = match json!({"top": {"nested": [{"deep": 1}]}, "other": 2}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let keys = map_keys(&map);
        assert!(keys.contains("top"));
        assert!(keys.contains("nested"));
        assert!(keys.contains("deep"));
        assert!(keys.contains("other"));
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_find_in_map_own_entry_first() {
        let map = match json!({"v": "top", "child": {"v": "nested"}}) {
            Value::Object(m) => m,
            _ => unreachable!(),
        };
        let found = find_in_map(&map, "v");
        assert_eq!(found, vec![&json!("top"), &json!("nested")]);
    }

    #[test]
    fn test_merge() {
        let dict1 = json!({"some_key": "some value"});
        let dict2 = json!({"some_other_key": "some other value"});
        let result = deep_merge(&dict1, &dict2);
        assert_eq!(
            result,
            json!({"some_key": "some value", "some_other_key": "some other value"})
        );
    }

    #[test]
    fn test_merge_recurses_and_overlay_wins() {
        let base = json!({"details": {"a": 1, "b": 2}, "severity": "INFO"});
        let overlay = json!({"details": {"b": 3, "c": 4}, "severity": "WARNING"});
        let result = deep_merge(&base, &overlay);
        assert_eq!(
            result,
            json!({"details": {"a": 1, "b": 3, "c": 4}, "severity": "WARNING"})
        );
        // inputs untouched
        assert_eq!(base, json!({"details": {"a": 1, "b": 2}, "severity": "INFO"}));
    }

    #[test]
    fn test_merge_type_conflict_overlay_wins() {
        let base = json!({"tags": {"nested": true}});
        let overlay = json!({"tags": ["flat"]});
        assert_eq!(deep_merge(&base, &overlay), json!({"tags": ["flat"]}));
    }

    #[test]
    fn test_sub_dict() {
        let source = complex_fixture();
        let nothing = json!("nothing");

        let result = submap(&source, ["some_key"], &nothing);
        assert_eq!(Value::Object(result), json!({"some_key": "some value"}));

        let result = submap(&source, ["sub_key.some_key"], &nothing);
        assert_eq!(
            Value::Object(result),
            json!({"sub_key.some_key": "some other value"})
        );

        let result = submap(&source, ["some_key", "sub_key.some_key"], &Value::Null);
        assert_eq!(
            Value::Object(result),
            json!({"some_key": "some value", "sub_key.some_key": "some other value"})
        );

        let result = submap(&source, ["missing"], &nothing);
        assert_eq!(Value::Object(result), json!({"missing": "nothing"}));
    }

    #[test]
    fn test_dict_match() {
        let target = complex_fixture();
        assert!(structural_match(&json!({"some_key": "some value"}), &target));
        assert!(structural_match(
            &json!({"sub_key.some_key": "some other value"}),
            &target
        ));
        assert!(!structural_match(
            &json!({"sub_key.some_key": "not some other value"}),
            &target
        ));
        assert!(!structural_match(&json!({"absent": "anything"}), &target));
    }
}
