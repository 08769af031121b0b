//! Time handling for TIME axes.
//!
//! Axis values are seconds since 1970-01-01T00:00:00Z. Clients talk ISO 8601.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

/// Parse an ISO 8601 date or date-time, assuming UTC when no zone is given.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    // Try full datetime with timezone
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Try without timezone (assume UTC)
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    // Try date only
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Parse a TIME request value into seconds since the epoch.
///
/// Accepts ISO 8601 or a bare number of seconds.
pub fn parse_time_value(s: &str) -> Result<f64, TimeParseError> {
    if let Ok(seconds) = s.parse::<f64>() {
        if seconds.is_finite() {
            return Ok(seconds);
        }
    }
    parse_iso8601(s).map(|dt| to_seconds(&dt))
}

pub fn to_seconds(dt: &DateTime<Utc>) -> f64 {
    dt.timestamp_millis() as f64 / 1000.0
}

/// Convert axis seconds back into a timestamp (millisecond precision).
pub fn from_seconds(seconds: f64) -> Result<DateTime<Utc>, TimeParseError> {
    if !seconds.is_finite() {
        return Err(TimeParseError::OutOfRange(seconds));
    }
    Utc.timestamp_millis_opt((seconds * 1000.0).round() as i64)
        .single()
        .ok_or(TimeParseError::OutOfRange(seconds))
}

/// Format as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format axis seconds as ISO 8601; falls back to the raw number when the
/// value cannot be represented as a date.
pub fn format_seconds(seconds: f64) -> String {
    match from_seconds(seconds) {
        Ok(dt) => format_iso8601(&dt),
        Err(_) => seconds.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Time value out of range: {0}")]
    OutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_iso8601() {
        let dt = parse_iso8601("2024-01-15T12:00:00Z").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 12);
    }

    #[test]
    fn test_parse_without_zone_and_date_only() {
        let a = parse_iso8601("2024-01-15T12:30:00").unwrap();
        assert_eq!(a.minute(), 30);
        let b = parse_iso8601("2024-01-15").unwrap();
        assert_eq!(b.hour(), 0);
        assert!(parse_iso8601("yesterday").is_err());
    }

    #[test]
    fn test_time_value_accepts_epoch_seconds() {
        assert_eq!(parse_time_value("2").unwrap(), 2.0);
        assert_eq!(parse_time_value("1970-01-01T00:00:03Z").unwrap(), 3.0);
    }

    #[test]
    fn test_format() {
        assert_eq!(format_seconds(86400.5), "1970-01-02T00:00:00.500Z");
    }
}
