use crate::error::{ProcessingError, Result};
use chrono::{NaiveDate, NaiveDateTime};

/// Parse a calendar date, accepting a bare `YYYY-MM-DD` or a timestamp whose
/// time part is dropped.
///
/// # Examples
/// ```
/// use gdd_timelapse::utils::parse_date;
///
/// let d = parse_date("2025-03-04 00:00:00").unwrap();
/// assert_eq!(d.to_string(), "2025-03-04");
/// ```
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts.date());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y%m%d").map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid date format: '{}'", value))
    })
}
