//! Timestamp encoding for TEXT columns

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Format written by SQLite's `datetime('now')`, always UTC
pub const LEGACY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// RFC 3339 with millisecond precision and a `Z` designator
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse ISO-8601 first, then fall back to the legacy format.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, LEGACY_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_is_utc_with_designator() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&ts), "2025-01-15T10:30:00.000Z");
    }

    #[test]
    fn test_parse_iso8601() {
        let expected = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2025-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T10:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-01-15T12:30:00+02:00"), Some(expected));
    }

    #[test]
    fn test_parse_legacy_as_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(parse_timestamp("2024-12-31 23:59:59"), Some(expected));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2025-01-15"), None);
    }
}
