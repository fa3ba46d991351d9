//! Time handling utilities for scraped fare data.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Calendar date format used by the upstream `date` column.
pub const TRIP_DATE_FORMAT: &str = "%Y-%m-%d";

/// Format the store writes `request_date` values in.
pub const REQUEST_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("invalid time of day '{0}'")]
    InvalidTime(String),

    #[error("invalid request timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Parse a trip date (`2024-05-01`).
pub fn parse_trip_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    NaiveDate::parse_from_str(s.trim(), TRIP_DATE_FORMAT)
        .map_err(|_| TimeParseError::InvalidDate(s.to_string()))
}

/// Parse a strict `HH:MM` time of day, as published upstream.
pub fn parse_clock_time(s: &str) -> Result<NaiveTime, TimeParseError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| TimeParseError::InvalidTime(s.to_string()))
}

/// Parse a time of day with optional seconds (`HH:MM` or `HH:MM:SS`).
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = s.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| TimeParseError::InvalidTime(s.to_string()))
}

/// Parse a scrape request timestamp.
///
/// Accepts ISO 8601 with `T` or space separator and optional fractional
/// seconds. Values carrying an offset are reduced to their local wall-clock
/// time, which is what the scraper recorded.
pub fn parse_request_timestamp(s: &str) -> Result<NaiveDateTime, TimeParseError> {
    let trimmed = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ndt);
        }
    }

    Err(TimeParseError::InvalidTimestamp(s.to_string()))
}

/// Render a request timestamp the way the store writes it.
pub fn format_request_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(REQUEST_TIMESTAMP_FORMAT).to_string()
}

/// Whole days between the scrape day and the trip day.
pub fn days_between(requested_at: &NaiveDateTime, trip_date: NaiveDate) -> i64 {
    (trip_date - requested_at.date()).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_clock_time() {
        let t = parse_clock_time("07:42").unwrap();
        assert_eq!((t.hour(), t.minute()), (7, 42));
        assert!(parse_clock_time("7h42").is_err());
        assert!(parse_clock_time("25:00").is_err());
    }

    #[test]
    fn test_parse_time_of_day_accepts_seconds() {
        let t = parse_time_of_day("18:05:30").unwrap();
        assert_eq!((t.hour(), t.minute(), t.second()), (18, 5, 30));
        assert_eq!(parse_time_of_day("18:05").unwrap().second(), 0);
    }

    #[test]
    fn test_parse_request_timestamp_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(6, 12, 33, 123_456)
            .unwrap();
        assert_eq!(
            parse_request_timestamp("2024-05-01T06:12:33.123456").unwrap(),
            expected
        );
        assert_eq!(
            parse_request_timestamp("2024-05-01 06:12:33.123456").unwrap(),
            expected
        );
        assert_eq!(
            parse_request_timestamp("2024-05-01T06:12:33.123456+02:00").unwrap(),
            expected
        );
        assert!(parse_request_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_request_timestamp_format_roundtrip() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let rendered = format_request_timestamp(&ts);
        assert_eq!(rendered, "2024-05-01T06:00:00.000000");
        assert_eq!(parse_request_timestamp(&rendered).unwrap(), ts);
    }

    #[test]
    fn test_days_between() {
        let requested = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        let trip = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
        assert_eq!(days_between(&requested, trip), 10);
        assert_eq!(days_between(&requested, requested.date()), 0);
    }
}
