//! Test fixtures and store helpers.
//!
//! Provides sample records and file stores that clean up after themselves.

use chrono::NaiveDate;
use filecab_core::{FileStore, MemoryStore, ParametersContainer, RuleSet, Validator};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a date, panicking on an impossible one.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// `Petro Semenov`, valid under both rule sets.
pub fn petro() -> ParametersContainer {
    ParametersContainer::new(
        "Petro",
        "Semenov",
        date(1990, 1, 1),
        21,
        Decimal::new(110030, 2),
        'A',
    )
}

/// `Ivanko Frankov`, valid under both rule sets.
pub fn ivan() -> ParametersContainer {
    ParametersContainer::new(
        "Ivanko",
        "Frankov",
        date(1985, 6, 15),
        25,
        Decimal::from(900),
        'B',
    )
}

/// `Lesya Ukrainka`, valid under both rule sets.
pub fn lesya() -> ParametersContainer {
    ParametersContainer::new(
        "Lesya",
        "Ukrainka",
        date(1971, 2, 25),
        30,
        Decimal::new(150000, 2),
        'B',
    )
}

/// A memory store holding `petro()`, `ivan()` and `lesya()` as ids 1 to 3.
pub fn populated_memory_store(rule_set: RuleSet) -> MemoryStore {
    use filecab_core::RecordStore;

    let mut store = MemoryStore::with_rule_set(rule_set);
    for params in [petro(), ivan(), lesya()] {
        store.create(&params).expect("fixture record is valid");
    }
    store
}

/// A file store in a temporary directory.
pub struct TempFileStore {
    /// The store instance.
    pub store: FileStore,
    rule_set: RuleSet,
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TempFileStore {
    /// Creates an empty store file.
    pub fn new(rule_set: RuleSet) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("cabinet.db");
        let store =
            FileStore::open(&path, Validator::for_set(rule_set)).expect("Failed to open file store");

        Self {
            store,
            rule_set,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the store file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes and reopens the store, as a new process would.
    pub fn reopen(&mut self) {
        self.store = FileStore::open(&self.path, Validator::for_set(self.rule_set))
            .expect("Failed to reopen file store");
    }

    /// Returns the store file size in bytes.
    pub fn file_len(&self) -> u64 {
        std::fs::metadata(&self.path)
            .expect("Failed to stat store file")
            .len()
    }
}

impl std::ops::Deref for TempFileStore {
    type Target = FileStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl std::ops::DerefMut for TempFileStore {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

/// Runs a test with a temporary file store.
///
/// # Example
///
/// ```rust
/// use filecab_core::{RecordStore, RuleSet};
/// use filecab_testkit::{petro, with_temp_file_store};
///
/// with_temp_file_store(RuleSet::Default, |store| {
///     store.create(&petro()).unwrap();
///     assert_eq!(store.get_stat().unwrap().total, 1);
/// });
/// ```
pub fn with_temp_file_store<F, R>(rule_set: RuleSet, f: F) -> R
where
    F: FnOnce(&mut TempFileStore) -> R,
{
    let mut store = TempFileStore::new(rule_set);
    f(&mut store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use filecab_core::{RecordStore, RECORD_SIZE};

    #[test]
    fn fixtures_pass_custom_rules() {
        let validator = Validator::for_set(RuleSet::Custom);
        for params in [petro(), ivan(), lesya()] {
            assert!(validator.validate(&params).is_ok());
        }
    }

    #[test]
    fn populated_store_has_three_records() {
        let store = populated_memory_store(RuleSet::Custom);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn temp_file_store_survives_reopen() {
        let mut store = TempFileStore::new(RuleSet::Default);
        store.create(&petro()).unwrap();
        assert_eq!(store.file_len(), RECORD_SIZE as u64);

        store.reopen();

        assert_eq!(store.get_records().unwrap().len(), 1);
        assert!(store.path().ends_with("cabinet.db"));
    }
}
