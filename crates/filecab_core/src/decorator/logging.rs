//! Call logging decorator.

use crate::error::StoreResult;
use crate::record::{ParametersContainer, Record, RecordIter};
use crate::snapshot::Snapshot;
use crate::store::{RecordStore, RestoreReport, StoreStat};
use crate::validation::Validator;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::fmt::Debug;
use tracing::{info, warn};

/// Emits one `info` event per call with its arguments and outcome.
#[derive(Debug)]
pub struct LoggingStore<S> {
    inner: S,
}

impl<S: RecordStore> LoggingStore<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwraps the decorator.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn logged<T: Debug>(operation: &str, args: &dyn Debug, result: StoreResult<T>) -> StoreResult<T> {
    match &result {
        Ok(value) => info!(operation, args = ?args, result = ?value, "store call"),
        Err(err) => warn!(operation, args = ?args, error = %err, "store call failed"),
    }
    result
}

fn logged_iter(operation: &str, args: &dyn Debug, result: StoreResult<RecordIter>) -> StoreResult<RecordIter> {
    match &result {
        Ok(records) => info!(operation, args = ?args, found = records.len(), "store call"),
        Err(err) => warn!(operation, args = ?args, error = %err, "store call failed"),
    }
    result
}

impl<S: RecordStore> RecordStore for LoggingStore<S> {
    fn create(&mut self, params: &ParametersContainer) -> StoreResult<i32> {
        logged("create", params, self.inner.create(params))
    }

    fn edit(&mut self, id: i32, params: &ParametersContainer) -> StoreResult<()> {
        logged("edit", &(id, params), self.inner.edit(id, params))
    }

    fn insert(&mut self, params: &ParametersContainer) -> StoreResult<bool> {
        logged("insert", params, self.inner.insert(params))
    }

    fn remove(&mut self, id: i32) -> StoreResult<()> {
        logged("remove", &id, self.inner.remove(id))
    }

    fn purge(&mut self) -> StoreResult<usize> {
        logged("purge", &(), self.inner.purge())
    }

    fn get_records(&self) -> StoreResult<Vec<Record>> {
        let result = self.inner.get_records();
        match &result {
            Ok(records) => info!(operation = "get_records", count = records.len(), "store call"),
            Err(err) => warn!(operation = "get_records", error = %err, "store call failed"),
        }
        result
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        logged("get_stat", &(), self.inner.get_stat())
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<RecordIter> {
        logged_iter(
            "find_by_first_name",
            &first_name,
            self.inner.find_by_first_name(first_name),
        )
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<RecordIter> {
        logged_iter(
            "find_by_last_name",
            &last_name,
            self.inner.find_by_last_name(last_name),
        )
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<RecordIter> {
        logged_iter(
            "find_by_date_of_birth",
            &date_of_birth,
            self.inner.find_by_date_of_birth(date_of_birth),
        )
    }

    fn find_by_working_hours(&self, working_hours: i16) -> StoreResult<RecordIter> {
        logged_iter(
            "find_by_working_hours",
            &working_hours,
            self.inner.find_by_working_hours(working_hours),
        )
    }

    fn find_by_annual_income(&self, annual_income: Decimal) -> StoreResult<RecordIter> {
        logged_iter(
            "find_by_annual_income",
            &annual_income,
            self.inner.find_by_annual_income(annual_income),
        )
    }

    fn find_by_driver_category(&self, category: char) -> StoreResult<RecordIter> {
        logged_iter(
            "find_by_driver_category",
            &category,
            self.inner.find_by_driver_category(category),
        )
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        let result = self.inner.make_snapshot();
        match &result {
            Ok(snapshot) => info!(operation = "make_snapshot", count = snapshot.len(), "store call"),
            Err(err) => warn!(operation = "make_snapshot", error = %err, "store call failed"),
        }
        result
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        logged("restore", &snapshot.len(), self.inner.restore(snapshot))
    }

    fn validator(&self) -> &Validator {
        self.inner.validator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorator::MeteredStore;
    use crate::error::StoreError;
    use crate::memory::MemoryStore;
    use crate::validation::RuleSet;

    fn petro() -> ParametersContainer {
        ParametersContainer::new(
            "Petro",
            "Semenov",
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            21,
            Decimal::new(110030, 2),
            'A',
        )
    }

    #[test]
    fn forwards_successes_and_failures() {
        let mut store = LoggingStore::new(MemoryStore::with_rule_set(RuleSet::Custom));

        assert_eq!(store.create(&petro()).unwrap(), 1);
        assert_eq!(store.find_by_last_name("semenov").unwrap().count(), 1);
        assert!(matches!(store.remove(5), Err(StoreError::NotFound { id: 5 })));
        assert_eq!(store.inner().len(), 1);
    }

    #[test]
    fn stacks_over_metered_store() {
        let mut store = LoggingStore::new(MeteredStore::new(MemoryStore::default()));

        store.create(&petro()).unwrap();
        store.get_records().unwrap();

        let snap = store.inner().metrics().snapshot();
        assert_eq!(snap.creates, 1);
        assert_eq!(snap.reads, 1);
    }
}
