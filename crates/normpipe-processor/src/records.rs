//! Batch record wire format
//!
//! Delivery-stream contract: incoming records carry an opaque id and a
//! base64 payload under camelCase keys; outgoing records echo the id, add a
//! status, and carry either the transformed payload or the original bytes.

use serde::{Deserialize, Serialize};

/// One incoming record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRecord {
    /// Caller-assigned record id, echoed back untouched
    pub record_id: String,

    /// Base64 of the record payload
    pub data: String,
}

/// A batch of incoming records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    pub records: Vec<RawRecord>,
}

/// Processing outcome for one record. The variant names are the wire
/// strings the delivery stream expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Ok,
    ProcessingFailed,
}

/// One outgoing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedRecord {
    pub record_id: String,
    pub result: RecordStatus,
    pub data: String,
}

/// The processed batch, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedBatch {
    pub records: Vec<ProcessedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incoming_field_names() {
        let batch: RawBatch = serde_json::from_value(json!({
            "records": [{"recordId": "r-1", "data": "eyJhIjoxfQ=="}]
        }))
        .unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].record_id, "r-1");
        assert_eq!(batch.records[0].data, "eyJhIjoxfQ==");
    }

    #[test]
    fn test_outgoing_field_names() {
        let record = ProcessedRecord {
            record_id: "r-1".to_string(),
            result: RecordStatus::ProcessingFailed,
            data: "AAAA".to_string(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"recordId": "r-1", "result": "ProcessingFailed", "data": "AAAA"})
        );
    }

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(serde_json::to_value(RecordStatus::Ok).unwrap(), json!("Ok"));
        assert_eq!(
            serde_json::to_value(RecordStatus::ProcessingFailed).unwrap(),
            json!("ProcessingFailed")
        );
    }
}
