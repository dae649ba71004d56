//! Batch-level metadata shared across plugin invocations.

use serde_json::{json, Map, Value};

/// Mutable context handed to every plugin in a batch. Plugins may read
/// values left by earlier plugins or record their own.
pub type Metadata = Map<String, Value>;

/// Metadata seeded once per batch, describing the process doing the work.
pub fn runtime_metadata() -> Metadata {
    let host = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string());
    let mut metadata = Map::new();
    metadata.insert(
        "runtime_details".to_string(),
        json!({
            "hostname": host,
            "pid": std::process::id(),
            "version": crate::PIPELINE_VERSION,
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }),
    );
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_metadata_shape() {
        let metadata = runtime_metadata();
        let details = metadata
            .get("runtime_details")
            .and_then(Value::as_object)
            .unwrap();
        assert!(details.contains_key("hostname"));
        assert!(details.contains_key("pid"));
        assert!(details.contains_key("version"));
        assert!(details.contains_key("os"));
        assert!(details.contains_key("arch"));
    }
}
