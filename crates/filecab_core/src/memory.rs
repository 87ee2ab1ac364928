//! In-memory record store.
//!
//! Owns the authoritative record list and an [`IndexSet`] over it. Name and
//! birth-date queries go through the indexes; working hours, income and
//! category queries scan the list. Every query result is memoized per store
//! instance until the next mutation.

use crate::error::{StoreError, StoreResult};
use crate::index::{name_key, IndexSet};
use crate::record::{ParametersContainer, Record, RecordIter, STATUS_LIVE};
use crate::snapshot::Snapshot;
use crate::store::{require_insert_id, require_positive_id, RecordStore, RestoreReport, StoreStat};
use crate::validation::{RuleSet, Validator};
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, info};

/// Memo cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Query {
    FirstName(String),
    LastName(String),
    DateOfBirth(NaiveDate),
    WorkingHours(i16),
    AnnualIncome(Decimal),
    DriverCategory(char),
}

/// A record store held entirely in memory.
///
/// # Example
///
/// ```rust
/// use chrono::NaiveDate;
/// use filecab_core::{MemoryStore, ParametersContainer, RecordStore, RuleSet};
/// use rust_decimal::Decimal;
///
/// let mut store = MemoryStore::with_rule_set(RuleSet::Custom);
/// let params = ParametersContainer::new(
///     "Petro",
///     "Semenov",
///     NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
///     21,
///     Decimal::new(110030, 2),
///     'A',
/// );
/// assert_eq!(store.create(&params).unwrap(), 1);
/// assert_eq!(store.find_by_first_name("PETRO").unwrap().count(), 1);
/// ```
#[derive(Debug)]
pub struct MemoryStore {
    records: Vec<Record>,
    indexes: IndexSet,
    validator: Validator,
    last_id: i32,
    memo: Mutex<HashMap<Query, Vec<Record>>>,
}

impl MemoryStore {
    /// Creates an empty store checking parameters with `validator`.
    #[must_use]
    pub fn new(validator: Validator) -> Self {
        Self {
            records: Vec::new(),
            indexes: IndexSet::new(),
            validator,
            last_id: 0,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an empty store using a preset rule set.
    #[must_use]
    pub fn with_rule_set(rule_set: RuleSet) -> Self {
        Self::new(Validator::for_set(rule_set))
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the index set, for consistency checks.
    #[must_use]
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// Returns the record list in storage order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of memoized queries.
    #[must_use]
    pub fn memoized_queries(&self) -> usize {
        self.memo.lock().len()
    }

    fn invalidate(&self) {
        self.memo.lock().clear();
    }

    fn append(&mut self, record: Record) {
        self.last_id = self.last_id.max(record.id());
        self.indexes.insert(&record, self.records.len());
        self.records.push(record);
    }

    fn resolve(&self, ids: &[i32]) -> Vec<Record> {
        ids.iter()
            .filter_map(|&id| self.indexes.position(id))
            .map(|position| self.records[position].clone())
            .collect()
    }

    fn scan(&self, predicate: impl Fn(&Record) -> bool) -> Vec<Record> {
        self.records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    fn memoized(&self, query: Query, lookup: impl FnOnce() -> Vec<Record>) -> RecordIter {
        let mut memo = self.memo.lock();
        let records = memo.entry(query).or_insert_with(lookup).clone();
        RecordIter::new(records)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Validator::default())
    }
}

impl RecordStore for MemoryStore {
    fn create(&mut self, params: &ParametersContainer) -> StoreResult<i32> {
        let params = params.normalized();
        self.validator.validate(&params)?;

        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::invalid_argument("record id space exhausted"))?;
        self.append(Record::from_parameters(id, &params));
        self.invalidate();

        debug!(id, "record created");
        Ok(id)
    }

    fn edit(&mut self, id: i32, params: &ParametersContainer) -> StoreResult<()> {
        let position = self
            .indexes
            .position(id)
            .ok_or_else(|| StoreError::not_found(id))?;
        let params = params.normalized();
        self.validator.validate(&params)?;

        let old = self.records[position].clone();
        self.records[position].apply(&params);
        self.indexes.update(&old, &self.records[position]);
        self.invalidate();

        debug!(id, "record edited");
        Ok(())
    }

    fn insert(&mut self, params: &ParametersContainer) -> StoreResult<bool> {
        let id = require_insert_id(params)?;
        if self.indexes.contains(id) {
            debug!(id, "insert rejected, id already present");
            return Ok(false);
        }
        let params = params.normalized();
        self.validator.validate(&params)?;

        self.append(Record::from_parameters(id, &params));
        self.invalidate();

        debug!(id, "record inserted");
        Ok(true)
    }

    fn remove(&mut self, id: i32) -> StoreResult<()> {
        require_positive_id(id)?;
        let position = self
            .indexes
            .position(id)
            .ok_or_else(|| StoreError::not_found(id))?;

        let record = self.records.remove(position);
        self.indexes.remove(&record);
        self.invalidate();

        debug!(id, "record removed");
        Ok(())
    }

    fn purge(&mut self) -> StoreResult<usize> {
        Ok(0)
    }

    fn get_records(&self) -> StoreResult<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn get_stat(&self) -> StoreResult<StoreStat> {
        Ok(StoreStat {
            total: self.records.len(),
            deleted: 0,
        })
    }

    fn find_by_first_name(&self, first_name: &str) -> StoreResult<RecordIter> {
        let key = name_key(first_name);
        Ok(self.memoized(Query::FirstName(key), || {
            self.resolve(self.indexes.by_first_name(first_name))
        }))
    }

    fn find_by_last_name(&self, last_name: &str) -> StoreResult<RecordIter> {
        let key = name_key(last_name);
        Ok(self.memoized(Query::LastName(key), || {
            self.resolve(self.indexes.by_last_name(last_name))
        }))
    }

    fn find_by_date_of_birth(&self, date_of_birth: NaiveDate) -> StoreResult<RecordIter> {
        Ok(self.memoized(Query::DateOfBirth(date_of_birth), || {
            self.resolve(self.indexes.by_date_of_birth(date_of_birth))
        }))
    }

    fn find_by_working_hours(&self, working_hours: i16) -> StoreResult<RecordIter> {
        Ok(self.memoized(Query::WorkingHours(working_hours), || {
            self.scan(|record| record.working_hours_per_week() == working_hours)
        }))
    }

    fn find_by_annual_income(&self, annual_income: Decimal) -> StoreResult<RecordIter> {
        Ok(self.memoized(Query::AnnualIncome(annual_income), || {
            self.scan(|record| record.annual_income() == annual_income)
        }))
    }

    fn find_by_driver_category(&self, category: char) -> StoreResult<RecordIter> {
        let category = category.to_ascii_uppercase();
        Ok(self.memoized(Query::DriverCategory(category), || {
            self.scan(|record| record.driver_license_category() == category)
        }))
    }

    fn make_snapshot(&self) -> StoreResult<Snapshot> {
        Ok(Snapshot::new(self.records.clone()))
    }

    fn restore(&mut self, snapshot: &Snapshot) -> StoreResult<RestoreReport> {
        let mut report = RestoreReport::default();
        let accepted = snapshot.accepted(&self.validator, &mut report);

        self.indexes.clear();
        let mut positions: HashMap<i32, usize> = self
            .records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id(), position))
            .collect();

        for record in accepted {
            let record = record.clone().with_status(STATUS_LIVE);
            match positions.get(&record.id()) {
                Some(&position) => {
                    self.records[position] = record;
                    report.replaced += 1;
                }
                None => {
                    positions.insert(record.id(), self.records.len());
                    self.records.push(record);
                    report.appended += 1;
                }
            }
        }

        self.indexes.rebuild(&self.records);
        self.last_id = self.last_id.max(self.indexes.max_id());
        self.invalidate();

        info!(
            replaced = report.replaced,
            appended = report.appended,
            skipped = report.skipped,
            "snapshot restored"
        );
        Ok(report)
    }

    fn validator(&self) -> &Validator {
        &self.validator
    }
}
