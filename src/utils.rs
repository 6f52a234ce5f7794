use chrono::{DateTime, NaiveDateTime};

use crate::types::TimestampUnit;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// 将纳秒时间戳格式化为 `YYYY-MM-DD HH:MM:SS[.fff]`（UTC）
pub fn format_timestamp(timestamp_ns: i64) -> String {
    let secs = timestamp_ns.div_euclid(NANOS_PER_SEC);
    let nanos = timestamp_ns.rem_euclid(NANOS_PER_SEC) as u32;

    match DateTime::from_timestamp(secs, nanos) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        None => format!("Invalid timestamp: {}", timestamp_ns),
    }
}

/// Parse a timestamp cell into nanoseconds since the epoch.
///
/// Integers are read in `unit`; floats (exported by some recorders in
/// scientific notation) are rounded. Anything else is tried as an RFC 3339 or
/// naive date-time string, taken as UTC.
pub fn parse_timestamp(raw: &str, unit: TimestampUnit) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(value) = raw.parse::<i64>() {
        return unit.to_nanos(value);
    }

    if let Ok(value) = raw.parse::<f64>() {
        let nanos = value * unit.nanos_per_unit() as f64;
        if nanos.is_finite() && nanos.abs() < i64::MAX as f64 {
            return Some(nanos.round() as i64);
        }
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.timestamp_nanos_opt();
    }

    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return naive.and_utc().timestamp_nanos_opt();
        }
    }

    None
}

/// Smallest integer `q` with `q * rhs >= lhs`, for positive `rhs`.
pub fn ceil_div(lhs: i64, rhs: i64) -> i64 {
    (lhs + rhs - 1).div_euclid(rhs)
}
