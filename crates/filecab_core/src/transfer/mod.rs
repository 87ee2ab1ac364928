//! Snapshot import and export.
//!
//! Both formats carry the same seven fields per record. Dates are written as
//! `MM/dd/yyyy`; income keeps its decimal scale. Readers decode text into
//! [`ParametersContainer`] values and hand them to
//! [`Snapshot::from_parameters`], which validates and counts skipped rows.

mod csv;
mod xml;

use crate::error::{StoreError, StoreResult};
use crate::record::ParametersContainer;
use crate::snapshot::{ImportReport, Snapshot};
use crate::validation::Validator;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub use self::csv::CSV_HEADER;

/// Date layout used by both formats.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Supported transfer formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma separated values with a header row.
    Csv,
    /// `<records>` document.
    Xml,
}

impl Format {
    /// Returns the lowercase format name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xml => "xml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xml" => Ok(Self::Xml),
            other => Err(format!("unknown format '{other}', expected 'csv' or 'xml'")),
        }
    }
}

impl Snapshot {
    /// Writes the snapshot to `path` in `format`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, or a format error from the writer.
    pub fn export_to_path(&self, path: impl AsRef<Path>, format: Format) -> StoreResult<()> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);
        match format {
            Format::Csv => self.write_csv(&mut out)?,
            Format::Xml => self.write_xml(&mut out)?,
        }
        out.flush()?;
        info!(path = %path.display(), %format, records = self.len(), "snapshot exported");
        Ok(())
    }

    /// Reads a snapshot from `path`, validating every row with `validator`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error, or a format error if the document as a whole
    /// cannot be parsed. Bad rows are skipped, not errors.
    pub fn import_from_path(
        path: impl AsRef<Path>,
        format: Format,
        validator: &Validator,
    ) -> StoreResult<(Self, ImportReport)> {
        let path = path.as_ref();
        let input = BufReader::new(File::open(path)?);
        let (snapshot, report) = match format {
            Format::Csv => Self::load_csv(input, validator)?,
            Format::Xml => Self::load_xml(input, validator)?,
        };
        info!(
            path = %path.display(),
            %format,
            imported = report.imported,
            skipped = report.skipped,
            "snapshot imported"
        );
        Ok((snapshot, report))
    }
}

/// Text fields of one imported row, before parsing.
#[derive(Debug, Default)]
struct RawRecord {
    id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    date_of_birth: Option<String>,
    working_hours: Option<String>,
    annual_income: Option<String>,
    driver_license_category: Option<String>,
}

impl RawRecord {
    fn into_parameters(self) -> StoreResult<ParametersContainer> {
        let id: i32 = parse_field("id", self.id)?;
        let date_of_birth = required("date of birth", self.date_of_birth).and_then(|text| {
            NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|err| {
                StoreError::invalid_argument(format!("date of birth '{text}': {err}"))
            })
        })?;
        let working_hours: i16 = parse_field("working hours", self.working_hours)?;
        let annual_income: Decimal = parse_field("annual income", self.annual_income)?;
        let category = required("driver license category", self.driver_license_category)
            .and_then(|text| single_char(&text))?;

        Ok(ParametersContainer::new(
            required("first name", self.first_name)?,
            required("last name", self.last_name)?,
            date_of_birth,
            working_hours,
            annual_income,
            category,
        )
        .with_id(id))
    }
}

fn required(name: &str, value: Option<String>) -> StoreResult<String> {
    value.ok_or_else(|| StoreError::invalid_argument(format!("missing {name}")))
}

fn parse_field<T>(name: &str, value: Option<String>) -> StoreResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let text = required(name, value)?;
    text.trim()
        .parse()
        .map_err(|err| StoreError::invalid_argument(format!("{name} '{text}': {err}")))
}

fn single_char(text: &str) -> StoreResult<char> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(StoreError::invalid_argument(format!(
            "driver license category '{text}' must be one character"
        ))),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
