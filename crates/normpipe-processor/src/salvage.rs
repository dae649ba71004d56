//! Recovering JSON objects from malformed payloads
//!
//! Some producers concatenate JSON documents or wrap them in log framing,
//! which breaks whole-text parsing. The scanner here walks the text counting
//! braces and emits each balanced block; salvage then takes the first block
//! that parses as a JSON object.

use serde_json::{Map, Value};

/// Iterator over balanced-brace blocks of a text.
///
/// Text outside any block is emitted as single-character fragments, so
/// callers are expected to keep only blocks that actually parse. A final
/// unbalanced block is discarded.
pub struct JsonBlocks<'a> {
    chars: std::str::Chars<'a>,
}

impl Iterator for JsonBlocks<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let mut depth: i64 = 0;
        let mut block = String::new();
        for c in self.chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            block.push(c);
            if depth == 0 {
                return Some(block.trim().to_string());
            }
        }
        None
    }
}

/// The balanced-brace blocks of `text`, in order.
pub fn json_blocks(text: &str) -> JsonBlocks<'_> {
    JsonBlocks {
        chars: text.chars(),
    }
}

/// The first balanced block of `text` that parses as a JSON object.
pub fn salvage_json_object(text: &str) -> Option<Map<String, Value>> {
    json_blocks(text)
        .filter(|block| !block.is_empty())
        .find_map(|block| match serde_json::from_str(&block) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        })
}
