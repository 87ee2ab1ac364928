//! Differential test harness.
//!
//! Drives a [`MemoryStore`] and a file store with the same operations and
//! checks after each step that both expose the same live records in the same
//! order. The stores may assign different ids to created records, so the
//! harness tracks each store's id per live record.

use crate::fixtures::TempFileStore;
use crate::generators::StoreOperation;
use filecab_core::{MemoryStore, ParametersContainer, Record, RecordStore, RuleSet, StoreError};

/// A memory store and a file store kept in lockstep.
pub struct DifferentialHarness {
    /// The in-memory store.
    pub memory: MemoryStore,
    /// The file store.
    pub file: TempFileStore,
    /// `(memory id, file id)` per live record, in storage order.
    live: Vec<(i32, i32)>,
}

impl DifferentialHarness {
    /// Creates empty stores using `rule_set`.
    pub fn new(rule_set: RuleSet) -> Self {
        Self {
            memory: MemoryStore::with_rule_set(rule_set),
            file: TempFileStore::new(rule_set),
            live: Vec::new(),
        }
    }

    /// Applies one operation to both stores and verifies they still agree.
    pub fn apply(&mut self, operation: &StoreOperation) {
        match operation {
            StoreOperation::Create(params) => self.create(params),
            StoreOperation::Insert { id, params } => self.insert(*id, params),
            StoreOperation::Edit { index, params } => self.edit(*index, params),
            StoreOperation::Remove { index } => self.remove(*index),
            StoreOperation::Purge => self.purge(),
        }
        self.verify();
    }

    /// Applies every operation in order.
    pub fn run(&mut self, operations: &[StoreOperation]) {
        for operation in operations {
            self.apply(operation);
        }
    }

    /// Returns the number of live records.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    fn create(&mut self, params: &ParametersContainer) {
        let memory_id = self.memory.create(params).expect("memory create");
        let file_id = self.file.create(params).expect("file create");
        self.live.push((memory_id, file_id));
    }

    fn insert(&mut self, id: i32, params: &ParametersContainer) {
        let params = params.clone().with_id(id);
        let in_memory = self.memory.insert(&params).expect("memory insert");
        let in_file = self.file.insert(&params).expect("file insert");
        assert_eq!(in_memory, in_file, "insert of id {id} disagreed");
        if in_memory {
            self.live.push((id, id));
        }
    }

    fn edit(&mut self, index: usize, params: &ParametersContainer) {
        let Some(&(memory_id, file_id)) = self.pick(index) else {
            return;
        };
        self.memory.edit(memory_id, params).expect("memory edit");
        self.file.edit(file_id, params).expect("file edit");
    }

    fn remove(&mut self, index: usize) {
        let Some(&(memory_id, file_id)) = self.pick(index) else {
            return;
        };
        self.memory.remove(memory_id).expect("memory remove");
        self.file.remove(file_id).expect("file remove");
        self.live.retain(|&(m, _)| m != memory_id);

        assert!(matches!(
            self.memory.remove(memory_id),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            self.file.remove(file_id),
            Err(StoreError::NotFound { .. })
        ));
    }

    fn purge(&mut self) {
        let deleted = self.file.get_stat().expect("file stat").deleted;
        assert_eq!(self.file.purge().expect("file purge"), deleted);
        assert_eq!(self.memory.purge().expect("memory purge"), 0);
        assert_eq!(self.file.get_stat().expect("file stat").deleted, 0);
    }

    fn pick(&self, index: usize) -> Option<&(i32, i32)> {
        if self.live.is_empty() {
            None
        } else {
            self.live.get(index % self.live.len())
        }
    }

    /// Asserts that both stores hold the tracked records with equal fields.
    pub fn verify(&self) {
        let memory = self.memory.get_records().expect("memory records");
        let file = self.file.get_records().expect("file records");

        let memory_ids: Vec<i32> = memory.iter().map(Record::id).collect();
        let file_ids: Vec<i32> = file.iter().map(Record::id).collect();
        let expected_memory: Vec<i32> = self.live.iter().map(|&(m, _)| m).collect();
        let expected_file: Vec<i32> = self.live.iter().map(|&(_, f)| f).collect();
        assert_eq!(memory_ids, expected_memory, "memory store ids");
        assert_eq!(file_ids, expected_file, "file store ids");

        for (m, f) in memory.iter().zip(&file) {
            assert_eq!(
                fields(m),
                fields(f),
                "records #{} and #{} differ",
                m.id(),
                f.id()
            );
        }

        assert!(
            self.memory.indexes().is_consistent_with(self.memory.records()),
            "memory indexes drifted"
        );
    }
}

/// A record's fields without its id.
fn fields(record: &Record) -> ParametersContainer {
    ParametersContainer {
        id: None,
        ..ParametersContainer::from(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ivan, lesya, petro};

    #[test]
    fn harness_tracks_mixed_operations() {
        let mut harness = DifferentialHarness::new(RuleSet::Custom);

        harness.run(&[
            StoreOperation::Create(petro()),
            StoreOperation::Create(ivan()),
            StoreOperation::Insert {
                id: 10_000,
                params: lesya(),
            },
            StoreOperation::Remove { index: 0 },
            StoreOperation::Edit {
                index: 1,
                params: petro(),
            },
            StoreOperation::Purge,
            StoreOperation::Create(lesya()),
        ]);

        assert_eq!(harness.live_count(), 3);
    }

    #[test]
    fn duplicate_insert_is_rejected_by_both() {
        let mut harness = DifferentialHarness::new(RuleSet::Default);
        let insert = StoreOperation::Insert {
            id: 10_001,
            params: petro(),
        };

        harness.apply(&insert);
        harness.apply(&insert);

        assert_eq!(harness.live_count(), 1);
    }
}
