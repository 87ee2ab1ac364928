//! Timing decorator.
//!
//! Counts every call into a shared [`StoreMetrics`] and logs its duration at
//! debug level.

use crate::error::StoreResult;
use crate::metrics::{Operation, StoreMetrics};
use crate::record::{ParametersContainer, Record, RecordIter};
use crate::snapshot::Snapshot;
use crate::store::{RecordStore, RestoreReport, StoreStat};
use crate::validation::Validator;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Times every call to the inner store and counts it in [`StoreMetrics`].
#[derive(Debug)]
pub struct MeteredStore<S> {
    inner: S,
    metrics: Arc<StoreMetrics>,
}

impl<S: RecordStore> MeteredStore<S> {
    /// Wraps `inner` with fresh counters.
    pub fn new(inner: S) -> Self {
        Self::with_metrics(inner, Arc::new(StoreMetrics::new()))
    }

    /// Wraps `inner`, counting into shared `metrics`.
    pub fn with_metrics(inner: S, metrics: Arc<StoreMetrics>) -> Self {
        Self { inner, metrics }
    }

    /// Returns the counters.
    pub fn metrics(&self) -> &StoreMetrics {
        &self.metrics
    }

    /// Returns a shared handle to the counters.
    pub fn metrics_handle(&self) -> Arc<StoreMetrics> {
        Arc::clone(&self.metrics)
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

fn timed<T>(
    metrics: &StoreMetrics,
    operation: Operation,
    call: impl FnOnce() -> StoreResult<T>,
) -> StoreResult<T> {
    let started = Instant::now();
    let result = call();
    let elapsed = started.elapsed();
    metrics.record(operation, elapsed, result.is_err());
    debug!(
        operation = operation.as_str(),
        elapsed_us = elapsed.as_micros() as u64,
        ok = result.is_ok(),
        "store call timed"
    );
    result
}

impl<S: RecordStore> RecordStore for MeteredStore<S> {
    fn create(&mut self, params: &ParametersContainer) -> StoreResult<i32> {
        timed(&self.metrics, Operation::Create, || self.inner.create(params))
    }

    fn edit(&mut self, id: i32, params: &ParametersContainer) -> StoreResult<()> {
        timed(&self.metrics, Operation::Edit, || self.inner.edit(id, params))
    }

    fn insert(&mut self, params: &ParametersContainer) -> StoreResult<bool> {
        timed(&self.metrics, Operation::Insert, || self.inner.insert(params))
    }

    fn remove(&mut self, id: i32) -> StoreResult<()> {
        timed(&self.metrics, Operation::Remove, || self.inner.remove(id))
    }

    fn purge(&mut self) -> StoreResult<usize> {
        timed(&self.metrics, Operation::Purge, || self.inner.purge())
    }

    fn get_records(&self) -> StoreResult<Vec<Record>> {
        timed(&self.metrics, Operation::Read, || self.inner.get_records())
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        timed(&self.metrics, Operation::Read, || self.inner.get_stat())
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<RecordIter> {
        timed(&self.metrics, Operation::Find, || {
            self.inner.find_by_first_name(first_name)
        })
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<RecordIter> {
        timed(&self.metrics, Operation::Find, || {
            self.inner.find_by_last_name(last_name)
        })
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<RecordIter> {
        timed(&self.metrics, Operation::Find, || {
            self.inner.find_by_date_of_birth(date_of_birth)
        })
    }

    fn find_by_working_hours(&self, working_hours: i16) -> StoreResult<RecordIter> {
        timed(&self.metrics, Operation::Find, || {
            self.inner.find_by_working_hours(working_hours)
        })
    }

    fn find_by_annual_income(&self, annual_income: Decimal) -> StoreResult<RecordIter> {
        timed(&self.metrics, Operation::Find, || {
            self.inner.find_by_annual_income(annual_income)
        })
    }

    fn find_by_driver_category(&self, category: char) -> StoreResult<RecordIter> {
        timed(&self.metrics, Operation::Find, || {
            self.inner.find_by_driver_category(category)
        })
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        timed(&self.metrics, Operation::Read, || self.inner.make_snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        timed(&self.metrics, Operation::Restore, || self.inner.restore(snapshot))
    }

    fn validator(&self) -> &Validator {
        self.inner.validator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn counts_each_call() {
        let mut store = MeteredStore::new(MemoryStore::with_rule_set(RuleSet::Custom));

        store.create(&petro()).unwrap();
        store.find_by_first_name("Petro").unwrap();
        store.get_stat().unwrap();
        let _ = store.remove(9);

        let snap = store.metrics().snapshot();
        assert_eq!(snap.creates, 1);
        assert_eq!(snap.finds, 1);
        assert_eq!(snap.reads, 1);
        assert_eq!(snap.removes, 1);
        assert_eq!(snap.errors, 1);
    }

    #[test]
    fn forwards_results_unchanged() {
        let mut store = MeteredStore::new(MemoryStore::with_rule_set(RuleSet::Custom));
        assert_eq!(store.create(&petro()).unwrap(), 1);
        assert_eq!(store.inner().len(), 1);
        assert_eq!(store.validator().rules(), store.inner().validator().rules());
    }

    #[test]
    fn shared_handle_outlives_decorator() {
        let store = MeteredStore::new(MemoryStore::default());
        let handle = store.metrics_handle();
        store.get_records().unwrap();
        drop(store);
        assert_eq!(handle.snapshot().reads, 1);
    }
}
