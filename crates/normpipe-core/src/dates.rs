//! Timestamp coercion.
//!
//! Log sources disagree wildly about time: epoch integers at second,
//! millisecond, microsecond or nanosecond resolution, RFC 3339 and RFC 2822
//! strings, Apache access-log stamps, bare dates, and free-form text like
//! `"Jan 1 12am 2020 UTC"`. [`to_utc`] accepts any of them and produces a
//! timezone-aware UTC instant; naive inputs are interpreted in the process
//! local timezone before conversion.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
    Utc,
};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// A value that could not be coerced into a UTC timestamp.
#[derive(Debug, Error)]
pub enum DateParseError {
    #[error("Unparseable timestamp: {0:?}")]
    Unparseable(String),
    #[error("Epoch value out of range: {0}")]
    OutOfRange(f64),
    #[error("Cannot interpret {0} as a timestamp")]
    UnsupportedType(&'static str),
}

/// Formats that carry their own UTC offset.
const OFFSET_FORMATS: &[&str] = &[
    // Apache / nginx access-log stamp.
    "%d/%b/%Y:%H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%a %b %e %H:%M:%S %z %Y",
];

/// Naive formats, interpreted in the process local timezone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%d/%b/%Y:%H:%M:%S",
    "%b %d %Y %H:%M:%S",
];

/// Date-only formats; midnight is assumed.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%b %d %Y", "%d %b %Y"];

/// Coerce a JSON value into a UTC timestamp.
///
/// Numbers are treated as UNIX epochs and rescaled to seconds by magnitude,
/// so second, millisecond, microsecond and nanosecond inputs all land on the
/// same instant. Zero and negative epochs collapse to 1970-01-01T00:00:00Z.
/// Strings of digits follow the same epoch path; everything else runs through
/// the format table and finally a token scanner for free-form text.
pub fn to_utc(value: &Value) -> Result<DateTime<Utc>, DateParseError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if i <= 0 {
                    return Ok(DateTime::UNIX_EPOCH);
                }
                digits_to_utc(&i.to_string())
            } else if let Some(u) = n.as_u64() {
                digits_to_utc(&u.to_string())
            } else {
                let f = n
                    .as_f64()
                    .ok_or_else(|| DateParseError::Unparseable(n.to_string()))?;
                float_to_utc(f)
            }
        }
        Value::String(s) => to_utc_str(s),
        Value::Bool(_) => Err(DateParseError::UnsupportedType("bool")),
        Value::Null => Err(DateParseError::UnsupportedType("null")),
        Value::Array(_) => Err(DateParseError::UnsupportedType("array")),
        Value::Object(_) => Err(DateParseError::UnsupportedType("object")),
    }
}

/// Coerce timestamp text into a UTC instant. See [`to_utc`].
pub fn to_utc_str(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DateParseError::Unparseable(text.to_string()));
    }
    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return digits_to_utc(trimmed);
    }
    // Numeric but not all digits: signed or fractional epochs like "-5"
    // or "1616848128.48".
    if let Ok(f) = trimmed.parse::<f64>() {
        if !f.is_finite() {
            return Err(DateParseError::Unparseable(text.to_string()));
        }
        return float_to_utc(f);
    }
    if let Some(dt) = parse_known_formats(trimmed) {
        return Ok(dt);
    }
    parse_fuzzy(trimmed)
}

/// Render a timestamp the way downstream consumers expect `utctimestamp`:
/// RFC 3339 with a numeric offset and no trailing zeros in the fraction.
pub fn iso_format(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// Digit strings are epochs whose unit is inferred from their length:
/// 10 digits is seconds, 13 milliseconds, 16 microseconds, 19 nanoseconds.
/// The divisor is 10^(len mod 10), which also reproduces the historical
/// handling of short epochs (a 9-digit value is divided by a billion).
fn digits_to_utc(digits: &str) -> Result<DateTime<Utc>, DateParseError> {
    let raw: f64 = digits
        .parse()
        .map_err(|_| DateParseError::Unparseable(digits.to_string()))?;
    if raw <= 0.0 {
        return Ok(DateTime::UNIX_EPOCH);
    }
    let divisor = 10f64.powi((digits.len() % 10) as i32);
    from_epoch_secs(raw / divisor)
}

/// Floats are epochs rescaled by magnitude: anything with more than ten
/// integer digits is divided down to seconds.
fn float_to_utc(value: f64) -> Result<DateTime<Utc>, DateParseError> {
    if value <= 0.0 {
        return Ok(DateTime::UNIX_EPOCH);
    }
    let magnitude = value.trunc().log10().floor() as i32;
    let secs = if magnitude > 9 {
        value / 10f64.powi(magnitude - 9)
    } else {
        value
    };
    from_epoch_secs(secs)
}

fn from_epoch_secs(secs: f64) -> Result<DateTime<Utc>, DateParseError> {
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos).ok_or(DateParseError::OutOfRange(secs))
}

fn parse_known_formats(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(local_to_utc(naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(local_to_utc(date.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

/// Interpret a naive datetime in the process local timezone. Ambiguous wall
/// times (DST fall-back) resolve to the earlier instant; nonexistent wall
/// times (spring-forward gap) are read as already UTC.
fn local_to_utc(naive: NaiveDateTime) -> DateTime<Utc> {
    match chrono::Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&naive),
    }
}

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2})(?:\.(\d{1,9}))?)?(am|pm)?$").unwrap()
});
static HOUR_AMPM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,2})(am|pm)$").unwrap());
static OFFSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])(\d{2}):?(\d{2})$").unwrap());
static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap());
static SLASH_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());

/// Last-resort scanner for free-form text such as `"Jan 1 12am 2020 UTC"`.
///
/// Tokens are classified independently: month names, clock times with an
/// optional am/pm suffix, four-digit years, one- or two-digit days, UTC/GMT
/// markers and numeric offsets. Unrecognized tokens are skipped. Missing date
/// parts default to today; missing time parts default to zero.
fn parse_fuzzy(text: &str) -> Result<DateTime<Utc>, DateParseError> {
    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;
    let mut day: Option<u32> = None;
    let mut hour: Option<u32> = None;
    let mut minute: u32 = 0;
    let mut second: u32 = 0;
    let mut nanos: u32 = 0;
    let mut offset_secs: Option<i32> = None;

    for raw in text.split(|c: char| c.is_whitespace() || c == ',') {
        let token = raw.trim_matches(|c: char| matches!(c, '.' | '(' | ')' | ';'));
        if token.is_empty() {
            continue;
        }
        let lower = token.to_ascii_lowercase();

        if month.is_none() {
            if let Some(m) = month_from_name(&lower) {
                month = Some(m);
                continue;
            }
        }
        if let Some(caps) = TIME_RE.captures(&lower) {
            let h: u32 = caps[1].parse().unwrap_or(0);
            minute = caps[2].parse().unwrap_or(0);
            second = caps.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
            nanos = caps.get(4).map_or(0, |m| frac_to_nanos(m.as_str()));
            hour = Some(apply_meridiem(h, caps.get(5).map(|m| m.as_str())));
            continue;
        }
        if let Some(caps) = HOUR_AMPM_RE.captures(&lower) {
            let h: u32 = caps[1].parse().unwrap_or(0);
            hour = Some(apply_meridiem(h, Some(&caps[2])));
            continue;
        }
        if matches!(lower.as_str(), "utc" | "gmt" | "z" | "zulu") {
            offset_secs = Some(0);
            continue;
        }
        if let Some(caps) = OFFSET_RE.captures(token) {
            let hh: i32 = caps[2].parse().unwrap_or(0);
            let mm: i32 = caps[3].parse().unwrap_or(0);
            let sign = if &caps[1] == "-" { -1 } else { 1 };
            offset_secs = Some(sign * (hh * 3600 + mm * 60));
            continue;
        }
        if let Some(caps) = ISO_DATE_RE.captures(&lower) {
            year = caps[1].parse().ok();
            month = caps[2].parse().ok();
            day = caps[3].parse().ok();
            continue;
        }
        if let Some(caps) = SLASH_DATE_RE.captures(&lower) {
            month = caps[1].parse().ok();
            day = caps[2].parse().ok();
            year = caps[3].parse().ok();
            continue;
        }
        if let Ok(n) = lower.parse::<u32>() {
            if lower.len() == 4 || n > 31 {
                if year.is_none() {
                    year = Some(n as i32);
                }
            } else if day.is_none() {
                day = Some(n);
            } else if year.is_none() {
                // A second small number after the day reads as a two-digit
                // year, "Jan 3 96" style.
                year = Some(if n < 70 { 2000 + n as i32 } else { 1900 + n as i32 });
            }
            continue;
        }
    }

    if year.is_none() && month.is_none() && day.is_none() && hour.is_none() {
        return Err(DateParseError::Unparseable(text.to_string()));
    }

    let today = Utc::now().date_naive();
    let date = NaiveDate::from_ymd_opt(
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
        day.unwrap_or_else(|| today.day()),
    )
    .ok_or_else(|| DateParseError::Unparseable(text.to_string()))?;
    let naive = date
        .and_hms_opt(hour.unwrap_or(0), minute, second)
        .ok_or_else(|| DateParseError::Unparseable(text.to_string()))?
        + Duration::nanoseconds(nanos as i64);

    match offset_secs {
        Some(off) => Ok(Utc.from_utc_datetime(&(naive - Duration::seconds(off as i64)))),
        None => Ok(local_to_utc(naive)),
    }
}

fn apply_meridiem(hour: u32, meridiem: Option<&str>) -> u32 {
    match meridiem {
        Some("am") if hour == 12 => 0,
        Some("pm") if hour < 12 => hour + 12,
        _ => hour,
    }
}

fn frac_to_nanos(frac: &str) -> u32 {
    let mut padded = frac.to_string();
    while padded.len() < 9 {
        padded.push('0');
    }
    padded[..9].parse().unwrap_or(0)
}

fn month_from_name(token: &str) -> Option<u32> {
    let month = match token {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(month)
}
