//! Key-case normalization.

use normpipe_core::{Event, Metadata, PluginResult, Transformation};
use serde_json::{Map, Value};

/// Recursively lowercases every mapping key at every depth. Values and list
/// ordering are never touched, so later plugins can match field names
/// without caring how the producer spelled them.
pub struct LowercaseKeys;

impl Transformation for LowercaseKeys {
    fn name(&self) -> &'static str {
        "lowercase_keys"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["*"]
    }

    fn priority(&self) -> i64 {
        1
    }

    fn apply(&self, event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        let mut lowered = Event::new();
        for (key, value) in event {
            lowered.insert(key.to_lowercase(), lower_value(value));
        }
        Ok(Some(lowered))
    }
}

fn lower_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map {
                out.insert(key.to_lowercase(), lower_value(item));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(lower_value).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(fixture: Value) -> Value {
        let event = match fixture {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        };
        let out = LowercaseKeys
            .apply(event, &mut Metadata::new())
            .unwrap()
            .unwrap();
        Value::Object(out)
    }

    #[test]
    fn test_keys_lowered_values_untouched() {
        let result = run(json!({"KEY1": "VALUE1", "Key2": 5}));
        assert_eq!(result, json!({"key1": "VALUE1", "key2": 5}));
    }

    #[test]
    fn test_nested_mappings() {
        let result = run(json!({"KEY1": {"SUBKEY1": {"Deep": "X"}}}));
        assert_eq!(result, json!({"key1": {"subkey1": {"deep": "X"}}}));
    }

    #[test]
    fn test_mappings_inside_lists() {
        let result = run(json!({"Records": [{"EventName": "A"}, {"EventName": "B"}], "N": [1, 2]}));
        assert_eq!(
            result,
            json!({"records": [{"eventname": "A"}, {"eventname": "B"}], "n": [1, 2]})
        );
    }
}
