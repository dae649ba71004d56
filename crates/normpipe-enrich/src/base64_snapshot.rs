//! Serialized snapshot side-channel.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use normpipe_core::{Event, Metadata, PluginResult, Transformation};
use serde_json::Value;

/// Stores a base64 copy of the whole event under `_base64`, for downstream
/// handlers that flatten or otherwise mangle nested JSON. The snapshot is
/// taken before the key itself is added, so it never contains itself.
pub struct Base64Snapshot;

impl Transformation for Base64Snapshot {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["*"]
    }

    fn priority(&self) -> i64 {
        100
    }

    fn apply(&self, mut event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        let serialized = serde_json::to_string(&event)?;
        event.insert(
            "_base64".to_string(),
            Value::String(STANDARD.encode(serialized)),
        );
        Ok(Some(event))
    }
}
