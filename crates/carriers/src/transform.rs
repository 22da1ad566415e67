//! Helpers shared by the vendor transforms: timestamp ordering, final
//! `TrackingInfo` assembly and lenient serde adapters for vendor fields that
//! arrive as either strings or numbers.

use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use shiptrack_domain::{PackageDetails, TrackingEvent, TrackingInfo, UNKNOWN};

/// Parses the timestamp shapes vendors emit: RFC 3339 with offset, naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (read as UTC) or a bare date.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Missing or unparseable timestamps sort as the oldest possible instant.
pub(crate) fn sort_key(timestamp: Option<&str>) -> DateTime<Utc> {
    timestamp
        .and_then(parse_timestamp)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub(crate) fn sort_newest_first(events: &mut [TrackingEvent]) {
    events.sort_by_key(|event| Reverse(sort_key(event.timestamp.as_deref())));
}

/// Builds the unified result from vendor events. The newest event supplies
/// status, location and last update; without events `fallback_status` (the
/// vendor's own current-status node) is used.
pub(crate) fn assemble(
    mut events: Vec<TrackingEvent>,
    fallback_status: Option<String>,
    estimated_delivery: Option<String>,
    details: PackageDetails,
) -> TrackingInfo {
    sort_newest_first(&mut events);

    let (status, location, last_update) = match events.first() {
        Some(latest) => (
            latest.status.clone(),
            latest.location.clone(),
            latest.timestamp.clone(),
        ),
        None => (
            non_empty(fallback_status).unwrap_or_else(|| UNKNOWN.to_string()),
            UNKNOWN.to_string(),
            None,
        ),
    };

    TrackingInfo {
        status,
        location,
        estimated_delivery: non_empty(estimated_delivery),
        last_update,
        events,
        details: details.non_empty(),
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// First non-blank candidate.
pub(crate) fn first_present<const N: usize>(candidates: [Option<&String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim())
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// `"5.2 LBS"`; `None` without a value.
pub(crate) fn format_measure(value: Option<&str>, unit: Option<&str>) -> Option<String> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    match unit.map(str::trim).filter(|u| !u.is_empty()) {
        Some(unit) => Some(format!("{value} {unit}")),
        None => Some(value.to_string()),
    }
}

/// `"12x8x4 IN"`; `None` unless all three sides are known.
pub(crate) fn format_dimensions(
    length: Option<&str>,
    width: Option<&str>,
    height: Option<&str>,
    unit: Option<&str>,
) -> Option<String> {
    fn side(value: Option<&str>) -> Option<&str> {
        value.map(str::trim).filter(|v| !v.is_empty())
    }
    let (length, width, height) = (side(length)?, side(width)?, side(height)?);
    format_measure(Some(&format!("{length}x{width}x{height}")), unit)
}

/// Accepts `"5.0"`, `5.0` or `5` and yields the textual form.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

/// Accepts `"14399"` or `14399`.
pub(crate) fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => text.trim().parse().ok(),
        Some(Value::Number(number)) => number.as_u64(),
        _ => None,
    })
}
