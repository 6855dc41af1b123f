//! Date normalization between display and storage encodings.
//!
//! Users read and type dates as `DD/MM/YYYY`; the Persistence Gateway stores
//! `YYYY-MM-DD`, sometimes with a time-of-day suffix attached. Conversions are
//! literal field shuffles. No timezone arithmetic happens here.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Display encoding, as accepted from the user.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// Storage encoding, as sent to the Persistence Gateway.
pub const STORAGE_FORMAT: &str = "%Y-%m-%d";

static DISPLAY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{2})/([0-9]{2})/([0-9]{4})$").expect("display date pattern"));

static STORAGE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})(?:[T ].*)?$").expect("storage date pattern")
});

/// Errors produced while converting or validating dates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// Input is not shaped like `DD/MM/YYYY`.
    #[error("Expected a date as DD/MM/YYYY, got {0:?}")]
    InvalidDisplayFormat(String),

    /// Input is not shaped like `YYYY-MM-DD` (with optional time suffix).
    #[error("Expected a date as YYYY-MM-DD, got {0:?}")]
    InvalidStorageFormat(String),

    /// Input has the right shape but names a day that does not exist.
    #[error("{0:?} is not a calendar date")]
    InvalidCalendarDate(String),
}

/// Converts a storage date (`YYYY-MM-DD`, optional time suffix) to `DD/MM/YYYY`.
pub fn to_display(storage: &str) -> Result<String, DateError> {
    let caps = STORAGE_DATE
        .captures(storage.trim())
        .ok_or_else(|| DateError::InvalidStorageFormat(storage.to_string()))?;
    Ok(format!("{}/{}/{}", &caps[3], &caps[2], &caps[1]))
}

/// Converts a display date (`DD/MM/YYYY`) to `YYYY-MM-DD`.
///
/// Only the shape is checked; call [`validate_display`] first when the input
/// came straight from the user.
pub fn to_storage(display: &str) -> Result<String, DateError> {
    let caps = DISPLAY_DATE
        .captures(display)
        .ok_or_else(|| DateError::InvalidDisplayFormat(display.to_string()))?;
    Ok(format!("{}-{}-{}", &caps[3], &caps[2], &caps[1]))
}

/// Checks that a display date has the `DD/MM/YYYY` shape and names a real day.
pub fn validate_display(display: &str) -> Result<(), DateError> {
    if !DISPLAY_DATE.is_match(display) {
        return Err(DateError::InvalidDisplayFormat(display.to_string()));
    }
    NaiveDate::parse_from_str(display, DISPLAY_FORMAT)
        .map(|_| ())
        .map_err(|_| DateError::InvalidCalendarDate(display.to_string()))
}

/// Parses a storage date, discarding any time suffix.
pub fn parse_storage(storage: &str) -> Result<NaiveDate, DateError> {
    let caps = STORAGE_DATE
        .captures(storage.trim())
        .ok_or_else(|| DateError::InvalidStorageFormat(storage.to_string()))?;

    // The pattern guarantees ASCII digits, so these parses cannot fail.
    let year: i32 = caps[1].parse().unwrap_or_default();
    let month: u32 = caps[2].parse().unwrap_or_default();
    let day: u32 = caps[3].parse().unwrap_or_default();

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| DateError::InvalidCalendarDate(storage.to_string()))
}

/// Formats a calendar date in storage encoding.
#[must_use]
pub fn format_storage(date: NaiveDate) -> String {
    date.format(STORAGE_FORMAT).to_string()
}

/// Today's local date in display encoding, used to pre-fill new rows.
#[must_use]
pub fn today_display() -> String {
    Local::now().date_naive().format(DISPLAY_FORMAT).to_string()
}
