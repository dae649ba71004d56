//! Plugin contract and criteria-matched dispatch
//!
//! The pipeline is built on a plugin architecture. Every transformation is a
//! [`Transformation`] registered with matching criteria and a priority; the
//! [`Registry`] sends each event through the plugins whose criteria it meets,
//! in ascending priority order.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::event::{criteria_tokens, record_plugin, Event};
use crate::metadata::Metadata;

/// Plugin error type
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Event is not a JSON object: got {0}")]
    InvalidEvent(&'static str),

    #[error("Plugin {0:?} failed to load: {1}")]
    LoadFailed(&'static str, String),

    #[error("Plugin operation failed: {0}")]
    OperationFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type PluginResult<T> = Result<T, PluginError>;

// =============================================================================
// TRANSFORMATION PLUGINS
// =============================================================================

/// A single event transformation.
///
/// Plugins receive the event by value and hand back the version later plugins
/// should see. Returning `Ok(None)` drops the event and stops dispatch.
pub trait Transformation: Send + Sync {
    /// Short name, recorded in the event's `plugins` list after each run.
    fn name(&self) -> &'static str;

    /// Matching criteria. An event qualifies when any token here appears in
    /// its [`criteria_tokens`]; the token `"*"` matches every event. An empty
    /// list is a registration error.
    fn criteria(&self) -> Vec<&'static str>;

    /// Plugins run in ascending priority order; ties keep registration order.
    fn priority(&self) -> i64 {
        100
    }

    /// Transform the event.
    fn apply(&self, event: Event, metadata: &mut Metadata) -> PluginResult<Option<Event>>;
}

// =============================================================================
// PLUGIN REGISTRY
// =============================================================================

struct Registration {
    priority: i64,
    criteria: Vec<String>,
    wildcard: bool,
    plugin: Box<dyn Transformation>,
}

/// Registration details for one plugin, for listings and logs.
#[derive(Debug, Clone)]
pub struct PluginEntry<'a> {
    pub name: &'static str,
    pub priority: i64,
    pub criteria: &'a [String],
}

/// A fixed, priority-ordered set of plugins for one pipeline stage.
pub struct Registry {
    registrations: Vec<Registration>,
}

impl Registry {
    /// Validate and order a plugin set. Plugins registering with empty
    /// criteria would never match anything, so that is refused outright.
    pub fn load(plugins: Vec<Box<dyn Transformation>>) -> PluginResult<Self> {
        let mut registrations = Vec::with_capacity(plugins.len());
        for plugin in plugins {
            let criteria: Vec<String> = plugin
                .criteria()
                .into_iter()
                .map(|c| c.to_lowercase())
                .collect();
            if criteria.is_empty() {
                return Err(PluginError::LoadFailed(
                    plugin.name(),
                    "registered with empty criteria".to_string(),
                ));
            }
            let wildcard = criteria.iter().any(|c| c == "*");
            debug!(
                plugin = plugin.name(),
                priority = plugin.priority(),
                criteria = ?criteria,
                "Registered plugin"
            );
            registrations.push(Registration {
                priority: plugin.priority(),
                criteria,
                wildcard,
                plugin,
            });
        }
        // Stable, so equal priorities keep their registration order.
        registrations.sort_by_key(|r| r.priority);
        Ok(Self { registrations })
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registered plugins in dispatch order.
    pub fn plugins(&self) -> impl Iterator<Item = PluginEntry<'_>> {
        self.registrations.iter().map(|r| PluginEntry {
            name: r.plugin.name(),
            priority: r.priority,
            criteria: &r.criteria,
        })
    }

    /// Send one raw record through every matching plugin.
    ///
    /// The event's criteria tokens are recomputed before each plugin, since
    /// earlier plugins may have renamed or added the very fields a later
    /// plugin matches on. A plugin returning `Ok(None)` drops the event; a
    /// plugin returning an error is logged and treated as a drop.
    pub fn dispatch(&self, raw: Value, metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        let mut event = match raw {
            Value::Object(map) => map,
            other => return Err(PluginError::InvalidEvent(json_type_name(&other))),
        };
        for registration in &self.registrations {
            if !registration.wildcard {
                let tokens = criteria_tokens(&event);
                let matched = registration
                    .criteria
                    .iter()
                    .any(|c| tokens.contains(c.as_str()));
                if !matched {
                    continue;
                }
            }
            let eventid = event
                .get("eventid")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            match registration.plugin.apply(event, metadata) {
                Ok(Some(mut next)) => {
                    record_plugin(&mut next, registration.plugin.name());
                    event = next;
                }
                Ok(None) => {
                    debug!(
                        plugin = registration.plugin.name(),
                        eventid = %eventid,
                        "Event dropped by plugin"
                    );
                    return Ok(None);
                }
                Err(err) => {
                    error!(
                        plugin = registration.plugin.name(),
                        eventid = %eventid,
                        error = %err,
                        "Plugin failed, dropping event"
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(event))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
