//! Canonical shell construction.

use chrono::Utc;
use normpipe_core::{
    is_shell_key, iso_format, walk, Event, Metadata, PluginResult, Transformation, SHELL_KEYS,
};
use serde_json::{json, Value};

/// Builds the canonical shell around whatever the record already carries.
///
/// Shell defaults lose to any value the event brought with it, and every
/// foreign top-level key moves under `details`. Running the plugin twice
/// yields the same event, since after the first pass no foreign top-level
/// keys remain.
pub struct EventShell;

fn shell_defaults() -> Event {
    let mut shell = Event::new();
    shell.insert("utctimestamp".to_string(), json!(iso_format(&Utc::now())));
    shell.insert("severity".to_string(), json!("INFO"));
    shell.insert("summary".to_string(), json!("UNKNOWN"));
    shell.insert("category".to_string(), json!("UNKNOWN"));
    shell.insert("source".to_string(), json!("UNKNOWN"));
    shell.insert("tags".to_string(), json!([]));
    shell.insert("plugins".to_string(), json!([]));
    shell.insert("details".to_string(), json!({}));
    shell
}

impl Transformation for EventShell {
    fn name(&self) -> &'static str {
        "event_shell"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["*"]
    }

    fn priority(&self) -> i64 {
        2
    }

    fn apply(&self, mut event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        // Maybe the shell elements are already all there; only merge in
        // defaults when something is missing. Event values always win.
        let needs_merge = {
            let keys = walk::map_keys(&event);
            !SHELL_KEYS.iter().all(|key| keys.contains(key))
        };
        if needs_merge {
            let overlay = Value::Object(std::mem::take(&mut event));
            if let Value::Object(merged) =
                walk::deep_merge(&Value::Object(shell_defaults()), &overlay)
            {
                event = merged;
            }
        }

        // `details` has to be a mapping before foreign keys move into it.
        // A scalar `details` brought by the record is kept, demoted one
        // level under itself.
        if !event.get("details").is_some_and(Value::is_object) {
            let displaced = event.remove("details");
            let mut fresh = Event::new();
            if let Some(old) = displaced {
                fresh.insert("details".to_string(), old);
            }
            event.insert("details".to_string(), Value::Object(fresh));
        }

        let foreign: Vec<String> = event
            .keys()
            .filter(|key| !is_shell_key(key))
            .cloned()
            .collect();
        if !foreign.is_empty() {
            let mut moved = Vec::with_capacity(foreign.len());
            for key in foreign {
                if let Some(value) = event.remove(&key) {
                    moved.push((key, value));
                }
            }
            if let Some(Value::Object(details)) = event.get_mut("details") {
                for (key, value) in moved {
                    details.insert(key, value);
                }
            }
        }
        Ok(Some(event))
    }
}
