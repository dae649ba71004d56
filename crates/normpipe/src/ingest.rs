//! File ingest for the CLI
//!
//! Two input shapes: a single `{"records": [...]}` batch document in the
//! delivery-stream wire format, and JSONL with one raw event per line.
//! `-` stands for stdin/stdout.

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use normpipe_core::runtime_metadata;
use normpipe_processor::{BatchProcessor, RawBatch, RawRecord, RecordStatus};
use std::io::{Read, Write};
use tracing::warn;
use uuid::Uuid;

pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {input}"))
    }
}

pub fn write_output(output: &str, content: &str) -> Result<()> {
    if output == "-" {
        std::io::stdout()
            .write_all(content.as_bytes())
            .context("Failed to write stdout")
    } else {
        std::fs::write(output, content).with_context(|| format!("Failed to write {output}"))
    }
}

/// Process a whole batch document and render the result document.
pub fn run_batch(processor: &BatchProcessor, text: &str) -> Result<String> {
    let batch: RawBatch = serde_json::from_str(text).context("Input is not a batch document")?;
    let processed = processor.process_batch(batch);
    let mut rendered =
        serde_json::to_string_pretty(&processed).context("Failed to render batch result")?;
    rendered.push('\n');
    Ok(rendered)
}

/// Process one raw JSON event per input line, emitting one normalized event
/// per line. Lines that fail processing are logged and skipped; blank lines
/// are ignored.
pub fn run_jsonl(processor: &BatchProcessor, text: &str) -> Result<String> {
    let mut metadata = runtime_metadata();
    let mut out = String::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = RawRecord {
            record_id: short_record_id(),
            data: STANDARD.encode(line),
        };
        let processed = processor.process_record(record, &mut metadata);
        match processed.result {
            RecordStatus::Ok => {
                let bytes = STANDARD
                    .decode(&processed.data)
                    .context("Failed to decode processed record")?;
                let rendered =
                    String::from_utf8(bytes).context("Processed record is not UTF-8")?;
                // Already newline-terminated by the processor.
                out.push_str(&rendered);
            }
            RecordStatus::ProcessingFailed => {
                warn!(
                    recordid = %processed.record_id,
                    line = number + 1,
                    "Line failed processing, skipped"
                );
            }
        }
    }
    Ok(out)
}

/// Short, log-friendly id for records synthesized from JSONL lines.
fn short_record_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}
