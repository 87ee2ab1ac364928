//! The index set kept by the in-memory store.

use crate::index::HashIndex;
use crate::record::Record;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Normalizes a name for index lookup.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_uppercase()
}

/// Secondary indexes over a record list.
///
/// - id to list position (unique)
/// - upper-cased first name to ids
/// - upper-cased last name to ids
/// - date of birth to ids
///
/// Every live record appears in every index exactly once.
#[derive(Debug, Clone)]
pub struct IndexSet {
    positions: HashMap<i32, usize>,
    first_name: HashIndex<String>,
    last_name: HashIndex<String>,
    date_of_birth: HashIndex<NaiveDate>,
}

impl Default for IndexSet {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSet {
    /// Creates an empty index set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            first_name: HashIndex::new(),
            last_name: HashIndex::new(),
            date_of_birth: HashIndex::new(),
        }
    }

    /// Adds a record stored at `position` in the list.
    pub fn insert(&mut self, record: &Record, position: usize) {
        let id = record.id();
        self.positions.insert(id, position);
        self.first_name.insert(name_key(record.first_name()), id);
        self.last_name.insert(name_key(record.last_name()), id);
        self.date_of_birth.insert(record.date_of_birth(), id);
    }

    /// Drops a record from every index.
    ///
    /// Positions of records after the removed one are shifted down by one,
    /// matching a `Vec::remove` on the record list.
    pub fn remove(&mut self, record: &Record) {
        let id = record.id();
        self.first_name.remove(&name_key(record.first_name()), id);
        self.last_name.remove(&name_key(record.last_name()), id);
        self.date_of_birth.remove(&record.date_of_birth(), id);

        if let Some(removed) = self.positions.remove(&id) {
            for position in self.positions.values_mut() {
                if *position > removed {
                    *position -= 1;
                }
            }
        }
    }

    /// Moves a record's entries from the keys of `old` to the keys of `new`.
    ///
    /// Only indexes whose key actually changed are touched.
    pub fn update(&mut self, old: &Record, new: &Record) {
        let id = old.id();

        let (old_first, new_first) = (name_key(old.first_name()), name_key(new.first_name()));
        if old_first != new_first {
            self.first_name.remove(&old_first, id);
            self.first_name.insert(new_first, id);
        }

        let (old_last, new_last) = (name_key(old.last_name()), name_key(new.last_name()));
        if old_last != new_last {
            self.last_name.remove(&old_last, id);
            self.last_name.insert(new_last, id);
        }

        if old.date_of_birth() != new.date_of_birth() {
            self.date_of_birth.remove(&old.date_of_birth(), id);
            self.date_of_birth.insert(new.date_of_birth(), id);
        }
    }

    /// Rebuilds every index from the given list.
    pub fn rebuild(&mut self, records: &[Record]) {
        self.positions = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id(), position))
            .collect();
        self.first_name
            .rebuild(records.iter().map(|r| (name_key(r.first_name()), r.id())));
        self.last_name
            .rebuild(records.iter().map(|r| (name_key(r.last_name()), r.id())));
        self.date_of_birth
            .rebuild(records.iter().map(|r| (r.date_of_birth(), r.id())));
    }

    /// Empties every index.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.first_name.clear();
        self.last_name.clear();
        self.date_of_birth.clear();
    }

    /// Returns the list position of the record with `id`.
    #[must_use]
    pub fn position(&self, id: i32) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    /// Returns whether a record with `id` is indexed.
    #[must_use]
    pub fn contains(&self, id: i32) -> bool {
        self.positions.contains_key(&id)
    }

    /// Returns the highest indexed id, or 0.
    #[must_use]
    pub fn max_id(&self) -> i32 {
        self.positions.keys().copied().max().unwrap_or(0)
    }

    /// Ids whose first name matches, case-insensitively.
    #[must_use]
    pub fn by_first_name(&self, first_name: &str) -> &[i32] {
        self.first_name.lookup(&name_key(first_name))
    }

    /// Ids whose last name matches, case-insensitively.
    #[must_use]
    pub fn by_last_name(&self, last_name: &str) -> &[i32] {
        self.last_name.lookup(&name_key(last_name))
    }

    /// Ids with the given date of birth.
    #[must_use]
    pub fn by_date_of_birth(&self, date_of_birth: NaiveDate) -> &[i32] {
        self.date_of_birth.lookup(&date_of_birth)
    }

    /// Returns the number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns whether no record is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Checks that the indexes describe exactly `records`.
    #[must_use]
    pub fn is_consistent_with(&self, records: &[Record]) -> bool {
        if self.positions.len() != records.len()
            || self.first_name.len() != records.len()
            || self.last_name.len() != records.len()
            || self.date_of_birth.len() != records.len()
        {
            return false;
        }

        records.iter().enumerate().all(|(position, record)| {
            let id = record.id();
            self.position(id) == Some(position)
                && self.by_first_name(record.first_name()).contains(&id)
                && self.by_last_name(record.last_name()).contains(&id)
                && self.by_date_of_birth(record.date_of_birth()).contains(&id)
        })
    }
}
