//! CLI command implementations.

pub mod records;
pub mod transfer;

use chrono::NaiveDate;
use filecab_core::transfer::DATE_FORMAT;

/// Parses a `MM/dd/yyyy` date argument.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|err| format!("invalid date '{value}' (expected MM/dd/yyyy): {err}"))
}
