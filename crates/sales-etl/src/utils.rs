//! Shared timestamp and calendar helpers.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Timestamp layouts accepted when coercing raw string timestamps.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a raw timestamp string into epoch milliseconds.
///
/// Returns `None` for unparsable values; callers decide whether the
/// resulting null survives (it does — the exit schema gate rejects it,
/// not the parser).
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().and_utc().timestamp_millis());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
        }
    }
    None
}

/// Convert epoch milliseconds back to a naive datetime.
pub fn datetime_from_ms(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

/// English month name, e.g. "January".
pub fn month_name(dt: &NaiveDateTime) -> String {
    dt.format("%B").to_string()
}

/// English weekday name, e.g. "Monday".
pub fn weekday_name(dt: &NaiveDateTime) -> String {
    dt.format("%A").to_string()
}

/// Hour of day, 0-23.
pub fn hour_of_day(dt: &NaiveDateTime) -> i64 {
    dt.hour() as i64
}

/// Calendar quarter label, e.g. "2024Q1".
pub fn quarter_label(dt: &NaiveDateTime) -> String {
    let quarter = (dt.month0() / 3) + 1;
    format!("{}Q{}", dt.year(), quarter)
}

/// ISO-8601 week number, 1-53.
pub fn iso_week(dt: &NaiveDateTime) -> i64 {
    dt.iso_week().week() as i64
}

/// ISO-8601 rendering used when datetimes cross a transport boundary.
pub fn iso_format(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(raw: &str) -> NaiveDateTime {
        datetime_from_ms(parse_timestamp_ms(raw).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_common_layouts() {
        assert!(parse_timestamp_ms("2024-03-15 14:30:00").is_some());
        assert!(parse_timestamp_ms("2024-03-15T14:30:00").is_some());
        assert!(parse_timestamp_ms("2024-03-15T14:30:00Z").is_some());
        assert!(parse_timestamp_ms("2024-03-15").is_some());
        assert!(parse_timestamp_ms("03/15/2024 14:30:00").is_some());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp_ms("not a date"), None);
        assert_eq!(parse_timestamp_ms(""), None);
        assert_eq!(parse_timestamp_ms("2024-13-40"), None);
    }

    #[test]
    fn test_calendar_derivations() {
        let value = dt("2024-03-15 14:30:00");
        assert_eq!(month_name(&value), "March");
        assert_eq!(weekday_name(&value), "Friday");
        assert_eq!(hour_of_day(&value), 14);
        assert_eq!(quarter_label(&value), "2024Q1");
        assert_eq!(iso_week(&value), 11);
    }

    #[test]
    fn test_quarter_boundaries() {
        assert_eq!(quarter_label(&dt("2024-01-01")), "2024Q1");
        assert_eq!(quarter_label(&dt("2024-04-01")), "2024Q2");
        assert_eq!(quarter_label(&dt("2024-12-31")), "2024Q4");
    }

    #[test]
    fn test_iso_format_round_trip() {
        let value = dt("2024-03-15 14:30:00");
        let rendered = iso_format(&value);
        assert_eq!(rendered, "2024-03-15T14:30:00.000");
        assert_eq!(parse_timestamp_ms(&rendered), Some(value.and_utc().timestamp_millis()));
    }
}
