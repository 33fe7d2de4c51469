//! ISO-8601 timestamp parsing for call records and filter bounds.
//!
//! Extraction tools are inconsistent: some emit RFC 3339 with an offset,
//! most emit local wall-clock time without one, a few only a date. All of
//! them are normalised to `DateTime<FixedOffset>`; values without an offset
//! are pinned to UTC+00:00 so they stay comparable with each other.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::error::TimestampError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

/// Parse an ISO-8601 date or date-time string.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(pin_utc(naive));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(pin_utc(midnight));
        }
    }

    Err(TimestampError(raw.to_string()))
}

fn pin_utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn parses_naive_datetime() {
        let dt = parse_timestamp("2024-01-01T08:00:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.offset().local_minus_utc(), 0);
    }

    #[test]
    fn parses_space_separator_and_fraction() {
        let dt = parse_timestamp("2024-03-05 23:59:59.250").unwrap();
        assert_eq!(dt.hour(), 23);
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn keeps_wall_clock_of_offset_values() {
        let dt = parse_timestamp("2024-01-01T02:30:00+05:00").unwrap();
        assert_eq!(dt.hour(), 2);
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn parses_compact_offset() {
        let dt = parse_timestamp("2024-01-01T02:30:00+0500").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_timestamp("2024-02-29").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.month(), 2);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2024-13-01T00:00:00").is_err());
    }

    #[test]
    fn instants_compare_across_offsets() {
        let a = parse_timestamp("2024-01-01T10:00:00+05:00").unwrap();
        let b = parse_timestamp("2024-01-01T06:00:00").unwrap();
        assert!(a < b);
    }
}
