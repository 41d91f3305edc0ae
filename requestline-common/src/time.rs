//! Timestamp utilities

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Parse a timestamp as reported by the playout system
///
/// Accepts RFC 3339 with any offset. Timestamps without an offset are
/// taken as UTC. Returns `None` for anything else.
pub fn parse_upstream_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Start of the hour bucket following `hour_start`
pub fn next_hour(hour_start: DateTime<Utc>) -> DateTime<Utc> {
    hour_start + Duration::hours(1)
}

/// Format an hour bucket for the playout log query string
///
/// Millisecond precision, `Z` suffix.
pub fn format_hour_param(hour_start: DateTime<Utc>) -> String {
    hour_start.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Milliseconds since the Unix epoch
pub fn epoch_millis(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_parse_rfc3339_utc() {
        let parsed = parse_upstream_timestamp("2024-05-01T14:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc3339_with_offset_converts_to_utc() {
        let parsed = parse_upstream_timestamp("2024-05-01T14:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_is_utc() {
        let parsed = parse_upstream_timestamp("2024-05-01T14:00:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap());

        let fractional = parse_upstream_timestamp("2024-05-01T14:00:00.250").unwrap();
        assert_eq!(fractional.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_upstream_timestamp("").is_none());
        assert!(parse_upstream_timestamp("not a date").is_none());
    }

    #[test]
    fn test_next_hour_crosses_midnight() {
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(
            next_hour(late),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_format_hour_param() {
        let hour = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        assert_eq!(format_hour_param(hour), "2024-05-01T14:00:00.000Z");
    }
}
