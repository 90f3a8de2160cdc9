//! Timestamp utilities and season week arithmetic

use chrono::{DateTime, NaiveDate, Utc};

use crate::{Error, Result};

/// Length of one scoring week in milliseconds
pub const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// 1-based week index of `now` within a season starting at `season_start`
///
/// `max(1, ceil((now - start) / 7 days))`. The season's start date is week 1,
/// and so is any instant before it.
pub fn week_number(season_start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed_ms = now.signed_duration_since(season_start).num_milliseconds();
    if elapsed_ms <= 0 {
        return 1;
    }
    // Ceiling division; elapsed_ms is strictly positive here
    ((elapsed_ms + WEEK_MS - 1) / WEEK_MS).max(1)
}

/// Parse a stored season start date
///
/// Accepts an RFC 3339 timestamp, a `YYYY-MM-DD HH:MM:SS` timestamp (UTC),
/// or a plain `YYYY-MM-DD` date which is taken as midnight UTC.
pub fn parse_season_start(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(Error::InvalidInput(format!(
        "Unrecognized season start date: {:?}",
        value
    )))
}
