//! Event identity.

use normpipe_core::{Event, Metadata, PluginResult, Transformation};
use serde_json::Value;
use uuid::Uuid;

/// Assigns a random identifier to any event that arrived without one.
/// A pre-existing `eventid` is never overwritten.
pub struct EnsureEventId;

impl Transformation for EnsureEventId {
    fn name(&self) -> &'static str {
        "ensure_eventid"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["*"]
    }

    fn priority(&self) -> i64 {
        10
    }

    fn apply(&self, mut event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        if !event.contains_key("eventid") {
            event.insert(
                "eventid".to_string(),
                Value::String(Uuid::new_v4().to_string()),
            );
        }
        Ok(Some(event))
    }
}
