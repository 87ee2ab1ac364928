//! CSV format.

use super::{format_date, RawRecord};
use crate::error::{StoreError, StoreResult};
use crate::snapshot::{ImportReport, Snapshot};
use crate::validation::Validator;
use std::io::{Read, Write};

/// Header row written before the records.
pub const CSV_HEADER: [&str; 7] = [
    "Id",
    "Firstname",
    "Last name",
    "Date of birthday",
    "Working hours per week",
    "Annual income",
    "Driver license category",
];

/// Maps CSV column indices to record fields.
#[derive(Debug, Default)]
struct ColumnMap {
    id: Option<usize>,
    first_name: Option<usize>,
    last_name: Option<usize>,
    date_of_birth: Option<usize>,
    working_hours: Option<usize>,
    annual_income: Option<usize>,
    driver_license_category: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> StoreResult<Self> {
        let mut map = Self::default();

        for (i, header) in headers.iter().enumerate() {
            match header.trim().to_lowercase().as_str() {
                "id" => map.id = Some(i),
                "firstname" | "first name" => map.first_name = Some(i),
                "last name" | "lastname" => map.last_name = Some(i),
                "date of birthday" | "date of birth" => map.date_of_birth = Some(i),
                "working hours per week" | "working hours" => map.working_hours = Some(i),
                "annual income" => map.annual_income = Some(i),
                "driver license category" => map.driver_license_category = Some(i),
                _ => {}
            }
        }

        if map.id.is_none() {
            return Err(StoreError::invalid_argument("CSV must have an 'Id' column"));
        }
        Ok(map)
    }

    fn parse(&self, row: &csv::StringRecord) -> RawRecord {
        let field = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| row.get(i))
                .filter(|s| !s.trim().is_empty())
                .map(String::from)
        };

        RawRecord {
            id: field(self.id),
            first_name: field(self.first_name),
            last_name: field(self.last_name),
            date_of_birth: field(self.date_of_birth),
            working_hours: field(self.working_hours),
            annual_income: field(self.annual_income),
            driver_license_category: field(self.driver_license_category),
        }
    }
}

impl Snapshot {
    /// Writes the header row and one row per record.
    ///
    /// # Errors
    ///
    /// Returns a CSV error if writing fails.
    pub fn write_csv<W: Write>(&self, writer: W) -> StoreResult<()> {
        let mut out = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        out.write_record(CSV_HEADER)?;
        for record in self {
            out.write_record([
                record.id().to_string(),
                record.first_name().to_string(),
                record.last_name().to_string(),
                format_date(record.date_of_birth()),
                record.working_hours_per_week().to_string(),
                record.annual_income().to_string(),
                record.driver_license_category().to_string(),
            ])?;
        }
        out.flush()?;
        Ok(())
    }

    /// Reads a CSV document, keeping rows `validator` accepts.
    ///
    /// Columns are matched by header name, so their order may vary.
    ///
    /// # Errors
    ///
    /// Returns a CSV error if the header row cannot be read, or
    /// `InvalidArgument` if it has no `Id` column.
    pub fn load_csv<R: Read>(reader: R, validator: &Validator) -> StoreResult<(Self, ImportReport)> {
        let mut input = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = input.headers()?.clone();
        let columns = ColumnMap::from_headers(&headers)?;

        let rows = input.records().map(|row| {
            row.map_err(StoreError::from)
                .and_then(|row| columns.parse(&row).into_parameters())
        });
        Ok(Self::from_parameters(rows, validator))
    }
}
