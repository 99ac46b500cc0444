use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::{Error, Result};

/// Parse a user-supplied point in time.
///
/// Accepts RFC 3339 (`2014-05-01T12:00:00+04:00`), unix seconds
/// (`1398931200`), `YYYY-MM-DD HH:MM:SS` and bare dates (`2014-05-01`, taken
/// as midnight UTC).
pub fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(secs) = input.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0)
            .ok_or_else(|| Error::InvalidWindow(format!("timestamp out of range: {secs}")));
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(input) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Ok(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(t) = d.and_hms_opt(0, 0, 0) {
            return Ok(t.and_utc());
        }
    }
    Err(Error::InvalidWindow(format!(
        "cannot parse time '{input}': expected RFC 3339, unix seconds or YYYY-MM-DD"
    )))
}

/// Render an optional timestamp for display.
pub fn format_time(t: Option<DateTime<Utc>>) -> String {
    t.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}
