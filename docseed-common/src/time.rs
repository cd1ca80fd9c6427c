//! Timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds since the Unix epoch to a timestamp
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Parse a date string as found in fixture files
///
/// Accepted forms, tried in order:
/// 1. RFC 3339 (`2024-01-01T00:00:00Z`, `2024-01-01T02:00:00+02:00`)
/// 2. Naive date-time without offset, taken as UTC (`2024-01-01T00:00:00`, `2024-01-01 00:00:00.5`)
/// 3. Bare date at UTC midnight (`2024-01-01`)
/// 4. Integer milliseconds since the epoch (`"1700000000000"`)
///
/// Anything finer than a millisecond is dropped, matching what
/// [`to_rfc3339_millis`] can carry.
pub fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(truncate_to_millis(dt.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(truncate_to_millis(naive.and_utc()));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    s.parse::<i64>().ok().and_then(from_epoch_millis)
}

/// Drop sub-millisecond precision
pub fn truncate_to_millis(dt: DateTime<Utc>) -> DateTime<Utc> {
    let nanos = dt.nanosecond() / 1_000_000 * 1_000_000;
    dt.with_nanosecond(nanos).unwrap_or(dt)
}

/// Render a timestamp the way stored documents carry it (millisecond precision, `Z` suffix)
pub fn to_rfc3339_millis(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
