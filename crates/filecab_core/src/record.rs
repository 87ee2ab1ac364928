//! Record and parameter types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

/// Status word of a live record.
pub const STATUS_LIVE: i16 = 0;
/// Status word of a soft-deleted record.
pub const STATUS_DELETED: i16 = 1;

/// One stored person record.
///
/// Records are produced by a store from a [`ParametersContainer`] and handed
/// out by value; callers never mutate a stored record directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    id: i32,
    first_name: String,
    last_name: String,
    date_of_birth: NaiveDate,
    working_hours_per_week: i16,
    annual_income: Decimal,
    driver_license_category: char,
    status: i16,
}

impl Record {
    /// Builds a live record with the given id from a parameter container.
    ///
    /// The container's own `id`, if any, is ignored.
    #[must_use]
    pub fn from_parameters(id: i32, params: &ParametersContainer) -> Self {
        Self {
            id,
            first_name: params.first_name.clone(),
            last_name: params.last_name.clone(),
            date_of_birth: params.date_of_birth,
            working_hours_per_week: params.working_hours_per_week,
            annual_income: params.annual_income,
            driver_license_category: params.driver_license_category,
            status: STATUS_LIVE,
        }
    }

    /// Returns the record id.
    #[must_use]
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the first name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Returns the last name.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Returns the date of birth.
    #[must_use]
    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    /// Returns the working hours per week.
    #[must_use]
    pub fn working_hours_per_week(&self) -> i16 {
        self.working_hours_per_week
    }

    /// Returns the annual income.
    #[must_use]
    pub fn annual_income(&self) -> Decimal {
        self.annual_income
    }

    /// Returns the driver license category.
    #[must_use]
    pub fn driver_license_category(&self) -> char {
        self.driver_license_category
    }

    /// Returns the raw status word (0 = live).
    #[must_use]
    pub fn status(&self) -> i16 {
        self.status
    }

    /// Returns whether the record is soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.status != STATUS_LIVE
    }

    /// Overwrites every field except `id` and `status`.
    pub(crate) fn apply(&mut self, params: &ParametersContainer) {
        self.first_name.clone_from(&params.first_name);
        self.last_name.clone_from(&params.last_name);
        self.date_of_birth = params.date_of_birth;
        self.working_hours_per_week = params.working_hours_per_week;
        self.annual_income = params.annual_income;
        self.driver_license_category = params.driver_license_category;
    }

    pub(crate) fn with_status(mut self, status: i16) -> Self {
        self.status = status;
        self
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{}, {}, {}, {}, {}, {}, {}",
            self.id,
            self.first_name,
            self.last_name,
            self.date_of_birth.format("%Y-%b-%d"),
            self.working_hours_per_week,
            self.annual_income,
            self.driver_license_category
        )
    }
}

/// Field values for creating or editing a record.
///
/// A container carries no storage identity beyond the optional `id` used by
/// `insert`; it is consumed by a single store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParametersContainer {
    /// Caller-supplied id, only consulted by `insert`.
    pub id: Option<i32>,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Working hours per week.
    pub working_hours_per_week: i16,
    /// Annual income.
    pub annual_income: Decimal,
    /// Driver license category.
    pub driver_license_category: char,
}

impl ParametersContainer {
    /// Creates a container without an id.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        date_of_birth: NaiveDate,
        working_hours_per_week: i16,
        annual_income: Decimal,
        driver_license_category: char,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth,
            working_hours_per_week,
            annual_income,
            driver_license_category,
        }
    }

    /// Attaches a caller-supplied id.
    #[must_use]
    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// Returns a copy with names trimmed and the category upper-cased.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            id: self.id,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            date_of_birth: self.date_of_birth,
            working_hours_per_week: self.working_hours_per_week,
            annual_income: self.annual_income,
            driver_license_category: self.driver_license_category.to_ascii_uppercase(),
        }
    }
}

impl From<&Record> for ParametersContainer {
    fn from(record: &Record) -> Self {
        Self {
            id: Some(record.id),
            first_name: record.first_name.clone(),
            last_name: record.last_name.clone(),
            date_of_birth: record.date_of_birth,
            working_hours_per_week: record.working_hours_per_week,
            annual_income: record.annual_income,
            driver_license_category: record.driver_license_category,
        }
    }
}

/// A record field, as named in validation messages and find queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// First name.
    FirstName,
    /// Last name.
    LastName,
    /// Date of birth.
    DateOfBirth,
    /// Working hours per week.
    WorkingHours,
    /// Annual income.
    AnnualIncome,
    /// Driver license category.
    DriverLicenseCategory,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FirstName => "first name",
            Self::LastName => "last name",
            Self::DateOfBirth => "date of birth",
            Self::WorkingHours => "working hours per week",
            Self::AnnualIncome => "annual income",
            Self::DriverLicenseCategory => "driver license category",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['_', '-', ' '], "").as_str() {
            "firstname" => Ok(Self::FirstName),
            "lastname" => Ok(Self::LastName),
            "dateofbirth" => Ok(Self::DateOfBirth),
            "workinghours" | "workinghoursperweek" => Ok(Self::WorkingHours),
            "annualincome" => Ok(Self::AnnualIncome),
            "driverlicensecategory" | "category" => Ok(Self::DriverLicenseCategory),
            other => Err(format!("unknown field '{other}'")),
        }
    }
}

/// Owned iterator over the result of a `find_by_*` query.
#[derive(Debug, Clone)]
pub struct RecordIter {
    inner: std::vec::IntoIter<Record>,
}

impl RecordIter {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        Self {
            inner: records.into_iter(),
        }
    }
}

impl Iterator for RecordIter {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for RecordIter {}
