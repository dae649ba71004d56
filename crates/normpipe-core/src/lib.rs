//! Normpipe Core - Event model, plugin traits, and dispatch
//!
//! This crate provides the foundational types and abstractions for the
//! normalization pipeline:
//!
//! - **Events**: the canonical event shell and criteria-token model
//! - **Plugins**: the transformation trait and the priority-ordered registry
//! - **Pipeline**: normalization-then-enrichment orchestration
//! - **Helpers**: dotted paths, structure walkers, timestamp and address
//!   coercion shared by plugins

pub mod dates;
pub mod event;
pub mod metadata;
pub mod net;
pub mod paths;
pub mod pipeline;
pub mod plugins;
pub mod walk;

// Re-export commonly used types
pub use dates::{iso_format, to_utc, to_utc_str, DateParseError};
pub use event::{criteria_tokens, is_shell_key, record_plugin, Event, SHELL_KEYS};
pub use metadata::{runtime_metadata, Metadata};
pub use net::{is_ip, is_ipv4, is_ipv6};
pub use pipeline::Pipeline;
pub use plugins::{PluginEntry, PluginError, PluginResult, Registry, Transformation};

/// Pipeline version recorded in batch metadata
pub const PIPELINE_VERSION: &str = env!("CARGO_PKG_VERSION");
