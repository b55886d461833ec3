//! Date boundary validation and wire formatting.
//!
//! Dates are naive calendar dates: parsing and formatting never consult a
//! timezone, so the formatted value always carries the same year, month and
//! day that were parsed. RFC 3339 timestamps are reduced to their UTC date.

use crate::constants::{INPUT_DATE_FORMAT, WIRE_DATE_FORMAT};
use crate::errors::{AppError, AppResult};
use crate::models::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

/// Parses a single date boundary.
///
/// Accepts `YYYY-MM-DD` (month and day may omit the zero padding, so
/// `2015-9-1` is valid) or an RFC 3339 timestamp.
///
/// Returns `Validation` if the input is empty or is not a real calendar date.
pub fn parse_date(raw: &str) -> AppResult<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("date must not be empty".to_string()));
    }

    match NaiveDate::parse_from_str(trimmed, INPUT_DATE_FORMAT) {
        Ok(date) => Ok(date),
        Err(e) => DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .map_err(|_| {
                AppError::Validation(format!("'{trimmed}' is not a valid YYYY-MM-DD date: {e}"))
            }),
    }
}

/// Parses and checks both boundaries of a date range.
///
/// # Errors
///
/// Returns `Validation` if either boundary is missing, empty or unparseable,
/// or if the start date falls after the end date. Equal dates are accepted.
pub fn parse_range(start_raw: Option<&str>, end_raw: Option<&str>) -> AppResult<DateRange> {
    let (start_raw, end_raw) = match (start_raw, end_raw) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(AppError::Validation(
                "both start date and end date are required".to_string(),
            ))
        }
    };

    let start = parse_date(start_raw)?;
    let end = parse_date(end_raw)?;
    debug!(start = %start, end = %end, "Parsed date range");

    DateRange::new(start, end).ok_or_else(|| {
        AppError::Validation(format!(
            "start date '{start}' must be less than or equal to end date '{end}'"
        ))
    })
}

/// Returns `true` when both boundaries parse and `start <= end`.
///
/// Never panics: parse failures are logged at debug level and reported as
/// `false`.
pub fn validate(start_raw: Option<&str>, end_raw: Option<&str>) -> bool {
    match parse_range(start_raw, end_raw) {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "Date range rejected");
            false
        }
    }
}

/// Formats a date as `MM-DD-YYYY`, the form the corrections endpoint expects.
pub fn format_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

/// Parses `raw` with [`parse_date`] and formats it with [`format_date`].
pub fn format_raw(raw: &str) -> AppResult<String> {
    parse_date(raw).map(format_date)
}
