//! Event-time discovery and normalization.

use chrono::Utc;
use normpipe_core::{
    iso_format, paths, to_utc, walk, Event, Metadata, PluginResult, Transformation,
};
use serde_json::Value;
use tracing::warn;

/// Likely timestamp fields, in precedence order.
const LIKELY_TIMESTAMP_FIELDS: [&str; 5] =
    ["timestamp", "@timestamp", "time", "eventtime", "start"];

/// Discovers the event's own clock and writes it to the top-level
/// `utctimestamp`. The first candidate field present whose value parses
/// wins; unparseable candidates are skipped, not fatal.
///
/// Records that split their clock across a `date` and a `time` field get
/// the pair recombined ("date time") before parsing. Whether or not a
/// timestamp was found, `details._utcprocessedtimestamp` records when
/// normalization ran.
pub struct Timestamps;

impl Transformation for Timestamps {
    fn name(&self) -> &'static str {
        "timestamps"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["*"]
    }

    fn priority(&self) -> i64 {
        20
    }

    fn apply(&self, mut event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        if let Some(stamp) = discover_timestamp(&event) {
            event.insert("utctimestamp".to_string(), Value::String(stamp));
        }
        paths::set(
            &mut event,
            "details._utcprocessedtimestamp",
            Value::String(iso_format(&Utc::now())),
        );
        Ok(Some(event))
    }
}

fn discover_timestamp(event: &Event) -> Option<String> {
    let keys = walk::map_keys(event);
    for field in LIKELY_TIMESTAMP_FIELDS {
        if !keys.contains(field) {
            continue;
        }
        let candidates: Vec<Value> = if field == "time" && keys.contains("date") {
            zip_date_time(event)
        } else {
            walk::find_in_map(event, field).into_iter().cloned().collect()
        };
        for candidate in candidates {
            match to_utc(&candidate) {
                Ok(parsed) => return Some(iso_format(&parsed)),
                Err(err) => {
                    warn!(
                        field,
                        value = %candidate,
                        error = %err,
                        "Skipping unparseable timestamp candidate"
                    );
                }
            }
        }
    }
    None
}

/// Pairwise-zip split date and time values back into "date time" strings.
fn zip_date_time(event: &Event) -> Vec<Value> {
    let dates = walk::find_in_map(event, "date");
    let times = walk::find_in_map(event, "time");
    dates
        .into_iter()
        .zip(times)
        .filter_map(|(date, time)| {
            let date = scalar_text(date)?;
            let time = scalar_text(time)?;
            Some(Value::String(format!("{date} {time}")))
        })
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(fixture: Value) -> Event {
        let event = match fixture {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        };
        Timestamps
            .apply(event, &mut Metadata::new())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_sets_utctimestamp_from_details() {
        let result = run(json!({"details": {"timestamp": "2021-03-27T12:28:48Z"}}));
        assert_eq!(
            result.get("utctimestamp"),
            Some(&json!("2021-03-27T12:28:48+00:00"))
        );
        assert!(paths::get_in(&result, "details._utcprocessedtimestamp").is_some());
    }

    #[test]
    fn test_epoch_start_field() {
        // VPC flow logs carry their clock in "start" as an epoch.
        let result = run(json!({"details": {"start": 1616848128, "action": "ACCEPT"}}));
        assert_eq!(
            result.get("utctimestamp"),
            Some(&json!("2021-03-27T12:28:48+00:00"))
        );
    }

    #[test]
    fn test_first_field_wins() {
        let result = run(json!({
            "details": {
                "eventtime": "2020-05-05T05:05:05Z",
                "timestamp": "2021-03-27T12:28:48Z"
            }
        }));
        assert_eq!(
            result.get("utctimestamp"),
            Some(&json!("2021-03-27T12:28:48+00:00"))
        );
    }

    #[test]
    fn test_unparseable_candidate_skipped() {
        let result = run(json!({
            "details": {
                "timestamp": "###garbage###",
                "eventtime": "2020-05-05T05:05:05Z"
            }
        }));
        assert_eq!(
            result.get("utctimestamp"),
            Some(&json!("2020-05-05T05:05:05+00:00"))
        );
    }

    #[test]
    fn test_date_and_time_recombined() {
        let result = run(json!({
            "details": {"date": "2020-01-01", "time": "12:30:00 UTC"}
        }));
        assert_eq!(
            result.get("utctimestamp"),
            Some(&json!("2020-01-01T12:30:00+00:00"))
        );
    }

    #[test]
    fn test_nochange_without_candidates() {
        let fixture = json!({
            "summary": "session opened for user root",
            "details": {"program": "sudo"}
        });
        let mut result = run(fixture.clone());
        // the only change is the processing stamp
        let details = result
            .get_mut("details")
            .and_then(Value::as_object_mut)
            .unwrap();
        assert!(details.remove("_utcprocessedtimestamp").is_some());
        assert_eq!(Value::Object(result), fixture);
    }

    #[test]
    fn test_processed_stamp_created_without_details() {
        let result = run(json!({}));
        assert!(paths::get_in(&result, "details._utcprocessedtimestamp").is_some());
        assert!(result.get("utctimestamp").is_none());
    }
}
