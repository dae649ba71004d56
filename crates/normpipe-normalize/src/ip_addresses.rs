//! Source and destination address discovery.

use normpipe_core::{is_ip, paths, walk, Event, Metadata, PluginResult, Transformation};
use serde_json::Value;

/// Likely places for a source IP, in precedence order.
const LIKELY_SOURCE_FIELDS: [&str; 19] = [
    "src",
    "srcaddr",
    "srcip",
    "src_ip",
    "source_ip",
    "sourceipaddress",
    "source_ip_address",
    "c-ip",
    "clientip",
    "remoteip",
    "remote_ip",
    "remoteaddr",
    "remote_host_ip_address",
    "ipaddress",
    "ip_address",
    "ipaddr",
    "id_orig_h",
    "x-forwarded-for",
    "http-x-forwarded-for",
];

/// Likely places for a destination IP, in precedence order.
const LIKELY_DESTINATION_FIELDS: [&str; 12] = [
    "dst",
    "dstip",
    "dst_ip",
    "dstaddr",
    "dest",
    "destaddr",
    "dest_ip",
    "destination_ip",
    "destinationipaddress",
    "destination_ip_address",
    "id_resp_h",
    "serverip",
];

/// Discovers IP addresses wherever the record hid them and normalizes the
/// field names into `details.sourceipaddress` / `details.destinationipaddress`.
///
/// Field-name precedence follows the lists above; within one field name the
/// first valid value wins. An explicit pre-populated value always beats the
/// heuristics. Every valid address found lands, de-duplicated, in
/// `details._ipaddresses`.
pub struct IpAddresses;

impl Transformation for IpAddresses {
    fn name(&self) -> &'static str {
        "ip_addresses"
    }

    fn criteria(&self) -> Vec<&'static str> {
        vec!["*"]
    }

    fn priority(&self) -> i64 {
        20
    }

    fn apply(&self, mut event: Event, _metadata: &mut Metadata) -> PluginResult<Option<Event>> {
        let mut all_ips: Vec<String> = Vec::new();

        // Sources can hide in proxy-chain headers, so the first comma
        // token is taken; destinations are used as-is.
        if !is_filled(detail(&event, "sourceipaddress")) {
            if let Some(ip) = discover(&event, &LIKELY_SOURCE_FIELDS, true) {
                paths::set(&mut event, "details.sourceipaddress", Value::String(ip));
            }
        }
        if let Some(ip) = valid_detail_ip(&event, "sourceipaddress") {
            all_ips.push(ip);
        }

        if !is_filled(detail(&event, "destinationipaddress")) {
            if let Some(ip) = discover(&event, &LIKELY_DESTINATION_FIELDS, false) {
                paths::set(&mut event, "details.destinationipaddress", Value::String(ip));
            }
        }
        if let Some(ip) = valid_detail_ip(&event, "destinationipaddress") {
            all_ips.push(ip);
        }

        if !all_ips.is_empty() {
            merge_found_ips(&mut event, all_ips);
        }

        Ok(Some(event))
    }
}

fn detail<'a>(event: &'a Event, key: &str) -> Option<&'a Value> {
    event.get("details")?.as_object()?.get(key)
}

/// Python-style truthiness: absent, null, empty and zero all read as unset.
fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
    }
}

fn discover(event: &Event, fields: &[&str], split_comma: bool) -> Option<String> {
    let keys = walk::map_keys(event);
    for field in fields {
        if !keys.contains(field) {
            continue;
        }
        for value in walk::find_in_map(event, field) {
            let Some(text) = value.as_str() else { continue };
            let candidate = if split_comma && text.contains(',') {
                text.split(',').next().unwrap_or(text).trim()
            } else {
                text
            };
            if is_ip(candidate) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn valid_detail_ip(event: &Event, key: &str) -> Option<String> {
    detail(event, key)
        .and_then(Value::as_str)
        .filter(|ip| is_ip(ip))
        .map(str::to_owned)
}

fn merge_found_ips(event: &mut Event, all_ips: Vec<String>) {
    if !is_filled(detail(event, "_ipaddresses")) {
        let list = all_ips.into_iter().map(Value::String).collect();
        paths::set(event, "details._ipaddresses", Value::Array(list));
        return;
    }
    let existing = event
        .get_mut("details")
        .and_then(Value::as_object_mut)
        .and_then(|details| details.get_mut("_ipaddresses"));
    if let Some(Value::Array(list)) = existing {
        for ip in all_ips {
            let candidate = Value::String(ip);
            if !list.contains(&candidate) {
                list.push(candidate);
            }
        }
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
        IpAddresses
            .apply(event, &mut Metadata::new())
            .unwrap()
            .unwrap()
    }

    fn at<'a>(event: &'a Event, path: &str) -> Option<&'a Value> {
        paths::get_in(event, path)
    }

    #[test]
    fn test_cloudtrail_style_event() {
        // sourceipaddress already sits under details after shell
        // normalization; discovery is skipped but the value is harvested.
        let result = run(json!({
            "details": {
                "eventname": "CreateLogStream",
                "eventsource": "logs.amazonaws.com",
                "sourceipaddress": "54.21.12.27",
                "useragent": "awslogs"
            }
        }));
        assert_eq!(
            at(&result, "details.sourceipaddress"),
            Some(&json!("54.21.12.27"))
        );
        assert_eq!(
            at(&result, "details._ipaddresses"),
            Some(&json!(["54.21.12.27"]))
        );
    }

    #[test]
    fn test_cloudfront_c_ip() {
        let result = run(json!({
            "details": {
                "c-ip": "139.59.66.23",
                "cs-uri-stem": "/wp-login.php",
                "sc-status": "404"
            }
        }));
        assert_eq!(
            at(&result, "details.sourceipaddress"),
            Some(&json!("139.59.66.23"))
        );
    }

    #[test]
    fn test_vpc_flow_pair() {
        let result = run(json!({
            "details": {
                "srcaddr": "172.31.9.69",
                "dstaddr": "172.31.9.12",
                "action": "ACCEPT"
            }
        }));
        assert_eq!(
            at(&result, "details.sourceipaddress"),
            Some(&json!("172.31.9.69"))
        );
        assert_eq!(
            at(&result, "details.destinationipaddress"),
            Some(&json!("172.31.9.12"))
        );
        assert_eq!(
            at(&result, "details._ipaddresses"),
            Some(&json!(["172.31.9.69", "172.31.9.12"]))
        );
    }

    #[test]
    fn test_nochange_on_raw_mixed_case() {
        // Raw records keep their producer's casing until the key-case
        // plugin runs; candidate names only match exactly.
        let fixture = json!({
            "Records": [{"sourceIPAddress": "54.21.12.27", "eventName": "CreateLogStream"}]
        });
        let result = run(fixture.clone());
        assert_eq!(Value::Object(result), fixture);
    }

    #[test]
    fn test_field_order_precedence() {
        let result = run(json!({
            "details": {"clientip": "5.6.7.8", "src": "1.2.3.4"}
        }));
        assert_eq!(at(&result, "details.sourceipaddress"), Some(&json!("1.2.3.4")));
    }

    #[test]
    fn test_invalid_candidates_rejected() {
        let result = run(json!({
            "details": {"src": "not-an-ip", "srcip": 127, "clientip": "5.6.7.8"}
        }));
        assert_eq!(at(&result, "details.sourceipaddress"), Some(&json!("5.6.7.8")));
    }

    #[test]
    fn test_sole_invalid_candidate_sets_nothing() {
        let result = run(json!({"details": {"src": "not-an-ip"}}));
        assert_eq!(at(&result, "details.sourceipaddress"), None);
        assert_eq!(at(&result, "details._ipaddresses"), None);
    }

    #[test]
    fn test_forwarded_chain_takes_first_hop() {
        let result = run(json!({
            "details": {"x-forwarded-for": "139.59.66.23, 10.0.0.1, 10.0.0.2"}
        }));
        assert_eq!(
            at(&result, "details.sourceipaddress"),
            Some(&json!("139.59.66.23"))
        );
    }

    #[test]
    fn test_existing_value_wins_over_discovery() {
        let result = run(json!({
            "details": {"sourceipaddress": "9.9.9.9", "src": "1.2.3.4"}
        }));
        assert_eq!(at(&result, "details.sourceipaddress"), Some(&json!("9.9.9.9")));
        assert_eq!(at(&result, "details._ipaddresses"), Some(&json!(["9.9.9.9"])));
    }

    #[test]
    fn test_ipaddresses_appended_without_duplicates() {
        let result = run(json!({
            "details": {
                "_ipaddresses": ["1.1.1.1", "2.2.2.2"],
                "src": "2.2.2.2",
                "dstaddr": "3.3.3.3"
            }
        }));
        assert_eq!(
            at(&result, "details._ipaddresses"),
            Some(&json!(["1.1.1.1", "2.2.2.2", "3.3.3.3"]))
        );
    }

    #[test]
    fn test_no_candidates_leaves_event_alone() {
        let fixture = json!({"details": {"program": "sudo"}, "summary": "session opened"});
        let result = run(fixture.clone());
        assert_eq!(Value::Object(result), fixture);
    }
}
