//! Normpipe Enrich - plugins that add fields without reshaping the event
//!
//! Enrichment runs after normalization, on events already in canonical
//! form. Plugins here only add: a stable event id for every record and a
//! base64 snapshot of the serialized event for downstream consumers.

mod base64_snapshot;
mod ensure_eventid;

pub use base64_snapshot::Base64Snapshot;
pub use ensure_eventid::EnsureEventId;

use normpipe_core::Transformation;

/// The full enrichment plugin set. Order here is irrelevant; the
/// registry orders by declared priority.
pub fn plugins() -> Vec<Box<dyn Transformation>> {
    vec![Box::new(EnsureEventId), Box::new(Base64Snapshot)]
}
