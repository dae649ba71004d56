//! Normpipe Processor - the batch boundary in front of the pipeline
//!
//! Consumes delivery-stream batches of base64 records, pushes each payload
//! through normalization and enrichment, and reports a per-record status.
//! One bad record never takes the batch down.

pub mod processor;
pub mod records;
pub mod salvage;

// Re-export commonly used types
pub use processor::{BatchProcessor, ProcessError};
pub use records::{ProcessedBatch, ProcessedRecord, RawBatch, RawRecord, RecordStatus};
pub use salvage::{json_blocks, salvage_json_object};
