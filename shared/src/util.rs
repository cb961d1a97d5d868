use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Text layout used when binding timestamps to either database engine.
pub const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC wall clock without offset, truncated to whole seconds.
pub fn now_naive() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Format a timestamp for a SQL parameter.
pub fn format_sql_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(SQL_TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp read back as text from SQLite or PostgreSQL.
///
/// Accepts the layouts the two engines and older rows actually hold:
/// `2024-03-04 10:00:00`, fractional seconds, a `T` separator,
/// a trailing UTC offset, or a bare date (midnight).
pub fn parse_sql_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(ts) = DateTime::parse_from_str(raw, fmt) {
            return Some(ts.naive_utc());
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_engine_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        assert_eq!(parse_sql_timestamp("2024-03-04 10:30:00"), Some(expected));
        assert_eq!(parse_sql_timestamp("2024-03-04T10:30:00"), Some(expected));
        assert_eq!(parse_sql_timestamp("2024-03-04 10:30:00.000000"), Some(expected));
        assert_eq!(parse_sql_timestamp("2024-03-04 10:30:00+00"), Some(expected));
        assert_eq!(parse_sql_timestamp("2024-03-04T10:30:00Z"), Some(expected));
    }

    #[test]
    fn bare_date_is_midnight() {
        let ts = parse_sql_timestamp("2023-11-06").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2023, 11, 6).unwrap());
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_sql_timestamp("next monday"), None);
        assert_eq!(parse_sql_timestamp(""), None);
    }

    #[test]
    fn format_round_trips() {
        let now = now_naive();
        assert_eq!(now.nanosecond(), 0);
        assert_eq!(parse_sql_timestamp(&format_sql_timestamp(&now)), Some(now));
    }
}
