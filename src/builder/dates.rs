//! Date parsing and normalization for range clauses

use crate::error::BuilderError;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// Civil offset attached to date ranges unless the builder overrides it
pub const DEFAULT_TIME_ZONE_SECS: i32 = 8 * 3600;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";
const ZULU_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn default_time_zone() -> FixedOffset {
    // 8h is always within the +/-24h bound
    FixedOffset::east_opt(DEFAULT_TIME_ZONE_SECS).unwrap_or_else(|| Utc.fix())
}

/// Parse a date or datetime. Inputs without an offset are taken as UTC.
pub fn parse(input: &str) -> Result<DateTime<Utc>, BuilderError> {
    Ok(parse_with_offset(input)?.with_timezone(&Utc))
}

/// Parse keeping the input's own offset; naive inputs get `+00:00`
pub fn parse_with_offset(input: &str) -> Result<DateTime<FixedOffset>, BuilderError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    let date = NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|e| BuilderError::InvalidDate {
        value: input.to_string(),
        reason: e.to_string(),
    })?;

    date.and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| BuilderError::InvalidDate {
            value: input.to_string(),
            reason: "midnight out of range".to_string(),
        })
}

/// Render as an ISO-8601 UTC instant, e.g. `2024-01-01T00:00:00Z`
pub fn to_zulu_string(input: &str) -> Result<String, BuilderError> {
    Ok(parse(input)?.format(ZULU_FORMAT).to_string())
}

/// Shift a date by whole days and render it as `YYYY-MM-DD`, on the
/// calendar of the input's own offset
pub fn shift_days(input: &str, days: i64) -> Result<String, BuilderError> {
    let shifted = parse_with_offset(input)? + Duration::days(days);
    Ok(shifted.format(DATE_FORMAT).to_string())
}
