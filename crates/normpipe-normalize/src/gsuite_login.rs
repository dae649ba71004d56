//! Google Workspace login activity records.

use normpipe_core::{
    iso_format, paths, to_utc, walk, Event, Metadata, PluginError, PluginResult, Transformation,
};
use serde_json::{json, Value};

/// Normalizes `admin#reports#activity` login records from the Workspace
/// admin reports API: canonical source and category, the actor lifted into
/// `details.user`, the login's own clock onto `utctimestamp`, a readable
/// summary, and success/suspicious classification.
pub struct GsuiteLogin;

impl Transformation for GsuiteLogin {
    fn name(&self) -> &'static str {
        "gsuite_login"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["kind"]
    }

    fn priority(&self) -> i64 {
        20
    }

    fn apply(&self, mut event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        // Criteria matching is loose; double check this really is an
        // activity record before touching anything.
        if !is_activity_record(&event) {
            return Ok(Some(event));
        }

        event.insert("source".to_string(), json!("gsuite"));
        match event.get_mut("tags") {
            Some(Value::Array(tags)) => tags.push(json!("gsuite")),
            _ => {
                event.insert("tags".to_string(), json!(["gsuite"]));
            }
        }

        // prefer the canonical name for the reported address
        let relocated = event
            .get_mut("details")
            .and_then(Value::as_object_mut)
            .and_then(|details| details.remove("ipaddress"));
        if let Some(ip) = relocated {
            paths::set(&mut event, "details.sourceipaddress", ip);
        }

        // the record's id.time is the login's own clock
        let login_time = paths::get_in(&event, "details.id.time")
            .filter(|value| is_present(value))
            .cloned();
        if let Some(time) = login_time {
            let parsed =
                to_utc(&time).map_err(|err| PluginError::OperationFailed(err.to_string()))?;
            event.insert(
                "utctimestamp".to_string(),
                Value::String(iso_format(&parsed)),
            );
        }

        let email = paths::get_in(&event, "details.actor.email")
            .and_then(Value::as_str)
            .filter(|email| !email.is_empty())
            .map(str::to_owned);
        if let Some(email) = email {
            paths::set(&mut event, "details.user", Value::String(email));
        }

        let summary = format!(
            "{} {} from IP {}",
            text_at(&event, "details.user"),
            text_at(&event, "details.events.0.name"),
            text_at(&event, "details.sourceipaddress"),
        );
        event.insert("summary".to_string(), Value::String(summary.clone()));
        event.insert("category".to_string(), json!("authentication"));

        if summary.contains("fail") {
            paths::set(&mut event, "details.success", json!(false));
        }
        if summary.contains("success") {
            paths::set(&mut event, "details.success", json!(true));
        }

        if has_suspicious_parameter(&event) {
            paths::set(&mut event, "details.suspicious", json!(true));
        }

        Ok(Some(event))
    }
}

fn is_activity_record(event: &Event) -> bool {
    let kind_matches = paths::get_in(event, "details.kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.contains("admin#reports#activity"));
    let details = event.get("details").and_then(Value::as_object);
    kind_matches
        && details.is_some_and(|d| d.contains_key("id"))
        && details.is_some_and(|d| d.contains_key("etag"))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn text_at(event: &Event, path: &str) -> String {
    match paths::get_in(event, path) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn has_suspicious_parameter(event: &Event) -> bool {
    let query = json!({"boolvalue": true, "name": "is_suspicious"});
    let Some(Value::Array(entries)) = paths::get_in(event, "details.events") else {
        return false;
    };
    entries
        .iter()
        .filter_map(|entry| entry.get("parameters"))
        .filter_map(Value::as_array)
        .flatten()
        .any(|parameter| walk::structural_match(&query, parameter))
}
