//! Fail-Closed Field Coercion
//!
//! Every logged field is coerced rather than rejected. Ambiguous values map
//! to the failure state: a `Success` cell that is not clearly a pass is a
//! failed check, and a port that is not a clean integer never matches a
//! critical port rule.

use crate::record::CheckType;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

/// Naive date-time layouts the collector has been seen to write
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

/// Coerce a `Success` cell. Only `true`, `yes` and `1` count as a pass.
pub fn parse_success(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "1"
    )
}

/// Coerce a `TargetPort` cell.
///
/// Integral floats such as `3389.0` are accepted since spreadsheet tooling
/// tends to rewrite integer columns that way.
pub fn parse_port(raw: &str) -> Option<u16> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(port) = raw.parse::<u16>() {
        return Some(port);
    }

    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&value) {
        Some(value as u16)
    } else {
        None
    }
}

/// Coerce a `Timestamp` cell to local wall-clock time
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Coerce a `ResponseTimeMs` cell
pub fn parse_response_time(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Classify a `CheckType` cell, ignoring case and inner whitespace
pub fn parse_check_type(raw: &str) -> CheckType {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    match compact.as_str() {
        "outboundtcp" => CheckType::OutboundTcp,
        "outboundicmp" => CheckType::OutboundIcmp,
        "inboundlistencheck" => CheckType::InboundListenCheck,
        _ => CheckType::Other(raw.trim().to_string()),
    }
}

/// Empty or whitespace-only text becomes `None`
pub fn optional_text(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}
