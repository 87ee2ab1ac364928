//! The store contract shared by every backend and decorator.

use crate::error::StoreResult;
use crate::record::{ParametersContainer, Record, RecordIter};
use crate::snapshot::Snapshot;
use crate::validation::Validator;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt;

/// Record counts reported by [`RecordStore::get_stat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStat {
    /// Total records, deleted ones included.
    pub total: usize,
    /// Records marked deleted and not yet purged.
    pub deleted: usize,
}

impl StoreStat {
    /// Returns the number of live records.
    #[must_use]
    pub fn live(&self) -> usize {
        self.total - self.deleted
    }
}

impl fmt::Display for StoreStat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} record(s), {} deleted", self.total, self.deleted)
    }
}

/// Outcome of [`RecordStore::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RestoreReport {
    /// Records that replaced an existing record with the same id.
    pub replaced: usize,
    /// Records appended because their id was new.
    pub appended: usize,
    /// Records rejected by the store's validator.
    pub skipped: usize,
}

impl RestoreReport {
    /// Returns the number of records that made it into the store.
    #[must_use]
    pub fn restored(&self) -> usize {
        self.replaced + self.appended
    }
}

/// Operations every record store provides.
///
/// Implementors:
///
/// - [`crate::MemoryStore`]: record list plus [`crate::index::IndexSet`]
/// - [`crate::FileStore`]: fixed-size slots on a storage backend
/// - [`crate::MeteredStore`] and [`crate::LoggingStore`]: decorators
///
/// A failed `create`/`edit`/`insert` leaves the store untouched.
pub trait RecordStore {
    /// Validates `params` and stores a new record, returning its id.
    ///
    /// # Errors
    ///
    /// Returns a validation error, or a storage error for file stores.
    fn create(&mut self, params: &ParametersContainer) -> StoreResult<i32>;

    /// Replaces every field of record `id` with `params`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no live record has `id`, or a validation error.
    fn edit(&mut self, id: i32, params: &ParametersContainer) -> StoreResult<()>;

    /// Stores a record under the id carried by `params`.
    ///
    /// Returns `Ok(false)` without touching the store if the id is taken.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `params.id` is missing or below 1, or a
    /// validation error.
    fn insert(&mut self, params: &ParametersContainer) -> StoreResult<bool>;

    /// Removes record `id`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for `id < 1`, `NotFound` if absent.
    fn remove(&mut self, id: i32) -> StoreResult<()>;

    /// Physically discards deleted records, returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns a storage error if compaction fails.
    fn purge(&mut self) -> StoreResult<usize>;

    /// Returns every live record in storage order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the records cannot be read.
    fn get_records(&self) -> StoreResult<Vec<Record>>;

    /// Returns total and deleted record counts.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the counts cannot be read.
    fn get_stat(&self) -> StoreResult<StoreStat>;

    /// Finds records by first name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a storage error for file stores.
    fn find_by_first_name(&self, first_name: &str) -> StoreResult<RecordIter>;

    /// Finds records by last name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a storage error for file stores.
    fn find_by_last_name(&self, last_name: &str) -> StoreResult<RecordIter>;

    /// Finds records by date of birth.
    ///
    /// # Errors
    ///
    /// Returns a storage error for file stores.
    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<RecordIter>;

    /// Finds records by working hours per week.
    ///
    /// # Errors
    ///
    /// Returns a storage error for file stores.
    fn find_by_working_hours(&self, working_hours: i16) -> StoreResult<RecordIter>;

    /// Finds records by annual income.
    ///
    /// # Errors
    ///
    /// Returns a storage error for file stores.
    fn find_by_annual_income(&self, annual_income: Decimal) -> StoreResult<RecordIter>;

    /// Finds records by driver license category.
    ///
    /// # Errors
    ///
    /// Returns a storage error for file stores.
    fn find_by_driver_category(&self, category: char) -> StoreResult<RecordIter>;

    /// Captures an owned copy of every live record.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the records cannot be read.
    fn make_snapshot(&self) -> StoreResult<Snapshot>;

    /// Merges a snapshot back: same-id records are replaced in place, new
    /// ids are appended, records missing from the snapshot are kept.
    ///
    /// # Errors
    ///
    /// Returns a storage error; invalid snapshot records are skipped.
    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport>;

    /// Returns the validator this store checks parameters against.
    fn validator(&self) -> &Validator;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn create(&mut self, params: &ParametersContainer) -> StoreResult<i32> {
        (**self).create(params)
    }

    fn edit(&mut self, id: i32, params: &ParametersContainer) -> StoreResult<()> {
        (**self).edit(id, params)
    }

    fn insert(&mut self, params: &ParametersContainer) -> StoreResult<bool> {
        (**self).insert(params)
    }

    fn remove(&mut self, id: i32) -> StoreResult<()> {
        (**self).remove(id)
    }

    fn purge(&mut self) -> StoreResult<usize> {
        (**self).purge()
    }

    fn get_records(&self) -> StoreResult<Vec<Record>> {
        (**self).get_records()
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        (**self).get_stat()
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<RecordIter> {
        (**self).find_by_first_name(first_name)
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<RecordIter> {
        (**self).find_by_last_name(last_name)
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<RecordIter> {
        (**self).find_by_date_of_birth(date_of_birth)
    }

    fn find_by_working_hours(&self, working_hours: i16) -> StoreResult<RecordIter> {
        (**self).find_by_working_hours(working_hours)
    }

    fn find_by_annual_income(&self, annual_income: Decimal) -> StoreResult<RecordIter> {
        (**self).find_by_annual_income(annual_income)
    }

    fn find_by_driver_category(&self, category: char) -> StoreResult<RecordIter> {
        (**self).find_by_driver_category(category)
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        (**self).make_snapshot()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        (**self).restore(snapshot)
    }

    fn validator(&self) -> &Validator {
        (**self).validator()
    }
}

/// Validates a caller-supplied insert id.
pub(crate) fn require_insert_id(params: &ParametersContainer) -> StoreResult<i32> {
    match params.id {
        Some(id) if id >= 1 => Ok(id),
        Some(id) => Err(crate::StoreError::invalid_argument(format!(
            "record id must be positive, got {id}"
        ))),
        None => Err(crate::StoreError::invalid_argument(
            "insert requires a record id",
        )),
    }
}

/// Rejects ids below 1.
pub(crate) fn require_positive_id(id: i32) -> StoreResult<()> {
    if id < 1 {
        return Err(crate::StoreError::invalid_argument(format!(
            "record id must be positive, got {id}"
        )));
    }
    Ok(())
}
