//! Date helpers
//!
//! Measurement dates are stored as `YYYY-MM-DD` text, so string order is
//! chronological order. These helpers only parse when arithmetic is needed.

use chrono::{Duration, NaiveDate};

use crate::StorageError;

/// Storage format for measurement dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the "last year" window in days
pub const LOOKBACK_DAYS: i64 = 365;

/// Parse a `YYYY-MM-DD` date, rejecting unpadded or trailing input
pub fn parse_date(value: &str) -> Result<NaiveDate, StorageError> {
    if value.len() != 10 {
        return Err(StorageError::InvalidDate(value.to_string()));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| StorageError::InvalidDate(value.to_string()))
}

/// True if `value` is a real calendar date in `YYYY-MM-DD` form
pub fn is_iso_date(value: &str) -> bool {
    parse_date(value).is_ok()
}

/// Date exactly [`LOOKBACK_DAYS`] before `latest`, formatted for comparison
/// against stored dates.
pub fn cutoff_date(latest: &str) -> Result<String, StorageError> {
    let latest = parse_date(latest)?;
    let cutoff = latest - Duration::days(LOOKBACK_DAYS);
    Ok(cutoff.format(DATE_FORMAT).to_string())
}
