//! # Date/Time Parsing
//!
//! Shared by the date/time caster and by configuration validation.
//!
//! Accepted inputs, tried in order:
//!
//! 1. RFC 3339 (`2024-05-01T10:00:00+02:00`, `2024-05-01T08:00:00Z`).
//! 2. Each configured strftime format. Formats without an offset are read
//!    as naive date-times (or dates at midnight) in UTC.
//! 3. Unix timestamps in seconds, given as integers or floats.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Parse a date/time string.
///
/// # Errors
///
/// Returns a reason naming every format tried.
pub fn parse_datetime(input: &str, formats: &[String]) -> Result<DateTime<FixedOffset>, String> {
    let input = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }
    for format in formats {
        if let Ok(dt) = DateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
        if let Ok(date) = NaiveDate::parse_from_str(input, format) {
            let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
            return Ok(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    Err(format!(
        "'{input}' is neither RFC 3339 nor one of [{}]",
        formats.join(", ")
    ))
}

/// Date/time from Unix seconds.
///
/// # Errors
///
/// Fails when the instant is outside chrono's representable range.
pub fn from_unix_seconds(seconds: i64) -> Result<DateTime<FixedOffset>, String> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| format!("timestamp {seconds} is out of range"))
}

/// Date/time from fractional Unix seconds, rounded to nanoseconds.
///
/// # Errors
///
/// Fails for non-finite or out-of-range values.
pub fn from_unix_float(seconds: f64) -> Result<DateTime<FixedOffset>, String> {
    if !seconds.is_finite() {
        return Err(format!("timestamp {seconds} is not finite"));
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| format!("timestamp {seconds} is out of range"))
}

/// Check that a strftime format string is well formed.
///
/// # Errors
///
/// Returns the offending format.
pub fn check_format(format: &str) -> Result<(), String> {
    if format.is_empty() {
        return Err("format is empty".to_string());
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(format!("'{format}' is not a valid strftime format"));
    }
    Ok(())
}
