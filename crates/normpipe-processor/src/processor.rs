//! Batch record processing
//!
//! The boundary in front of the pipeline: decode each base64 record, run it
//! through normalization and enrichment, and report a status per record. A
//! record that cannot be decoded, parsed, or normalized is marked failed
//! with its original data untouched; the rest of the batch is unaffected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use normpipe_core::{runtime_metadata, Metadata, Pipeline, PluginError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::records::{ProcessedBatch, ProcessedRecord, RawBatch, RawRecord, RecordStatus};
use crate::salvage::salvage_json_object;

/// Why a single record could not be shipped.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Record data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Record payload is not a JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pipeline rejected the record: {0}")]
    Pipeline(#[from] PluginError),

    #[error("Record dropped during dispatch")]
    Dropped,
}

/// Runs whole batches of raw records through a [`Pipeline`].
pub struct BatchProcessor {
    pipeline: Pipeline,
    salvage: bool,
}

impl BatchProcessor {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            salvage: false,
        }
    }

    /// Enable recovering JSON blocks from payloads that fail whole-text
    /// parsing. Off by default.
    pub fn with_salvage(mut self, salvage: bool) -> Self {
        self.salvage = salvage;
        self
    }

    /// Process a batch in input order. Never fails as a whole; each record
    /// carries its own status. Runtime metadata is generated once here and
    /// shared by every record in the batch.
    pub fn process_batch(&self, batch: RawBatch) -> ProcessedBatch {
        let mut metadata = runtime_metadata();
        let records: Vec<ProcessedRecord> = batch
            .records
            .into_iter()
            .map(|record| self.process_record(record, &mut metadata))
            .collect();
        info!(records = records.len(), "Processed batch");
        ProcessedBatch { records }
    }

    /// Process one record, mapping any failure to `ProcessingFailed` with
    /// the original data passed through unmodified.
    pub fn process_record(&self, record: RawRecord, metadata: &mut Metadata) -> ProcessedRecord {
        match self.transform(&record, metadata) {
            Ok(data) => {
                debug!(recordid = %record.record_id, "Record processed");
                ProcessedRecord {
                    record_id: record.record_id,
                    result: RecordStatus::Ok,
                    data,
                }
            }
            Err(err) => {
                error!(
                    recordid = %record.record_id,
                    error = %err,
                    "Record failed processing"
                );
                ProcessedRecord {
                    record_id: record.record_id,
                    result: RecordStatus::ProcessingFailed,
                    data: record.data,
                }
            }
        }
    }

    fn transform(
        &self,
        record: &RawRecord,
        metadata: &mut Metadata,
    ) -> Result<String, ProcessError> {
        let payload = STANDARD.decode(&record.data)?;
        let raw = self.parse_payload(&payload)?;
        let event = self
            .pipeline
            .normalize_and_enrich(raw, metadata)?
            .ok_or(ProcessError::Dropped)?;
        // Trailing newline so line-oriented consumers see record boundaries.
        let mut line = serde_json::to_string(&event)?;
        line.push('\n');
        Ok(STANDARD.encode(line))
    }

    fn parse_payload(&self, payload: &[u8]) -> Result<Value, ProcessError> {
        match serde_json::from_slice(payload) {
            Ok(value) => Ok(value),
            Err(err) if self.salvage => {
                let text = String::from_utf8_lossy(payload);
                match salvage_json_object(&text) {
                    Some(map) => Ok(Value::Object(map)),
                    None => Err(ProcessError::Json(err)),
                }
            }
            Err(err) => Err(ProcessError::Json(err)),
        }
    }
}
