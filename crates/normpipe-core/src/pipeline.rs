//! Two-stage event pipeline
//!
//! Every record passes through normalization first (shaping it into the
//! canonical shell) and then enrichment (adding derived data). A drop in
//! either stage is final; enrichment never sees an event normalization
//! discarded.

use serde_json::Value;

use crate::event::Event;
use crate::metadata::Metadata;
use crate::plugins::{PluginResult, Registry};

/// The normalization and enrichment registries, run in that order.
pub struct Pipeline {
    normalization: Registry,
    enrichment: Registry,
}

impl Pipeline {
    pub fn new(normalization: Registry, enrichment: Registry) -> Self {
        Self {
            normalization,
            enrichment,
        }
    }

    /// Run one raw record through both stages.
    ///
    /// Returns `Ok(None)` when any plugin drops the event, and an error only
    /// when the record is not a JSON object to begin with.
    pub fn normalize_and_enrich(
        &self,
        raw: Value,
        metadata: &mut Metadata,
    ) -> PluginResult<Option<Event>> {
        let normalized = match self.normalization.dispatch(raw, metadata)? {
            Some(event) => event,
            None => return Ok(None),
        };
        self.enrichment.dispatch(Value::Object(normalized), metadata)
    }

    pub fn normalization(&self) -> &Registry {
        &self.normalization
    }

    pub fn enrichment(&self) -> &Registry {
        &self.enrichment
    }
}
