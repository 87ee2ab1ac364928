//! Store configuration.

use crate::decorator::{LoggingStore, MeteredStore};
use crate::error::{StoreError, StoreResult};
use crate::file::FileStore;
use crate::memory::MemoryStore;
use crate::metrics::StoreMetrics;
use crate::store::RecordStore;
use crate::validation::{RuleSet, ValidationRules, Validator};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for opening a store.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Preset used when no explicit rules are given.
    pub rule_set: RuleSet,

    /// Explicit rules, usually loaded from a rules document.
    pub rules: Option<ValidationRules>,

    /// Wrap the store in a [`MeteredStore`].
    pub metered: bool,

    /// Wrap the store in a [`LoggingStore`].
    pub logged: bool,

    /// Sync the file after every write (file stores only).
    pub sync_on_write: bool,

    /// Counters shared with the metered wrapper.
    pub metrics: Option<Arc<StoreMetrics>>,
}

impl StoreConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a rule set preset.
    #[must_use]
    pub fn rule_set(mut self, rule_set: RuleSet) -> Self {
        self.rule_set = rule_set;
        self
    }

    /// Overrides the preset with explicit rules.
    #[must_use]
    pub fn rules(mut self, rules: ValidationRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Sets whether calls are timed and counted.
    #[must_use]
    pub fn metered(mut self, value: bool) -> Self {
        self.metered = value;
        self
    }

    /// Sets whether calls are logged.
    #[must_use]
    pub fn logged(mut self, value: bool) -> Self {
        self.logged = value;
        self
    }

    /// Sets whether file writes are synced.
    #[must_use]
    pub fn sync_on_write(mut self, value: bool) -> Self {
        self.sync_on_write = value;
        self
    }

    /// Counts into `metrics`; implies [`Self::metered`].
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<StoreMetrics>) -> Self {
        self.metrics = Some(metrics);
        self.metered = true;
        self
    }

    /// Builds the validator this configuration describes.
    #[must_use]
    pub fn validator(&self) -> Validator {
        match &self.rules {
            Some(rules) => Validator::new(rules.clone()),
            None => Validator::for_set(self.rule_set),
        }
    }
}

impl ValidationRules {
    /// Reads one rule set from a JSON rules document.
    ///
    /// The document maps rule set names to rules:
    ///
    /// ```json
    /// { "default": { "firstName": { "min": 2, "max": 60 }, ... },
    ///   "custom": { ... } }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or `Config` if it is
    /// malformed or lacks `rule_set`.
    pub fn load(path: impl AsRef<Path>, rule_set: RuleSet) -> StoreResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::from_json(&text, rule_set)
            .map_err(|err| StoreError::config(format!("{}: {err}", path.display())))
    }

    /// Parses one rule set from a JSON rules document.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the document is malformed or lacks `rule_set`.
    pub fn from_json(text: &str, rule_set: RuleSet) -> StoreResult<Self> {
        let mut sets: HashMap<String, Self> =
            serde_json::from_str(text).map_err(|err| StoreError::config(err.to_string()))?;
        sets.remove(rule_set.as_str())
            .ok_or_else(|| StoreError::config(format!("no '{rule_set}' rule set in document")))
    }
}

/// Where a store keeps its records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Records live only in memory.
    Memory,
    /// Records live in a slot file at the given path.
    File(PathBuf),
}

/// Opens a store and wraps it in the configured decorators.
///
/// The metered wrapper sits inside the logging one, so logged calls include
/// the timing overhead.
///
/// # Errors
///
/// Returns an I/O error if a file store cannot be opened.
pub fn open_store(config: &StoreConfig, kind: BackendKind) -> StoreResult<Box<dyn RecordStore>> {
    let validator = config.validator();

    let mut store: Box<dyn RecordStore> = match kind {
        BackendKind::Memory => Box::new(MemoryStore::new(validator)),
        BackendKind::File(path) => Box::new(
            FileStore::open(&path, validator)?.with_sync_on_write(config.sync_on_write),
        ),
    };

    if config.metered {
        store = match &config.metrics {
            Some(metrics) => Box::new(MeteredStore::with_metrics(store, Arc::clone(metrics))),
            None => Box::new(MeteredStore::new(store)),
        };
    }
    if config.logged {
        store = Box::new(LoggingStore::new(store));
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ParametersContainer;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    const RULES: &str = r#"{
        "default": {
            "firstName": { "min": 2, "max": 60 },
            "lastName": { "min": 2, "max": 60 },
            "dateOfBirth": { "min": "1950-01-01", "max": "2024-12-31" },
            "workingHours": { "min": 1, "max": 100 },
            "annualIncome": { "min": "0", "max": "1000000" },
            "driverLicenseCategories": ["A", "B", "C", "D"]
        },
        "custom": {
            "firstName": { "min": 5, "max": 10 },
            "lastName": { "min": 5, "max": 10 },
            "dateOfBirth": { "min": "1960-01-01", "max": "2010-12-31" },
            "workingHours": { "min": 20, "max": 30 },
            "annualIncome": { "min": "500", "max": "1500" },
            "driverLicenseCategories": ["A", "B"]
        }
    }"#;

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
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.rule_set, RuleSet::Default);
        assert!(!config.metered);
        assert!(!config.logged);
        assert!(!config.sync_on_write);
    }

    #[test]
    fn builder_pattern() {
        let config = StoreConfig::new()
            .rule_set(RuleSet::Custom)
            .metered(true)
            .logged(true)
            .sync_on_write(true);

        assert_eq!(config.rule_set, RuleSet::Custom);
        assert!(config.metered);
        assert!(config.logged);
        assert!(config.sync_on_write);
        assert_eq!(config.validator().rules(), &ValidationRules::custom_rules());
    }

    #[test]
    fn rules_document_matches_presets() {
        assert_eq!(
            ValidationRules::from_json(RULES, RuleSet::Default).unwrap(),
            ValidationRules::default_rules()
        );
        assert_eq!(
            ValidationRules::from_json(RULES, RuleSet::Custom).unwrap(),
            ValidationRules::custom_rules()
        );
    }

    #[test]
    fn load_reports_missing_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, "{}").unwrap();

        assert!(matches!(
            ValidationRules::load(&path, RuleSet::Custom),
            Err(StoreError::Config { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        fs::write(&path, RULES).unwrap();

        let rules = ValidationRules::load(&path, RuleSet::Custom).unwrap();
        assert_eq!(rules.driver_license_categories, vec!['A', 'B']);
    }

    #[test]
    fn open_store_wraps_decorators() {
        let metrics = Arc::new(StoreMetrics::new());
        let config = StoreConfig::new()
            .rule_set(RuleSet::Custom)
            .logged(true)
            .with_metrics(Arc::clone(&metrics));

        let mut store = open_store(&config, BackendKind::Memory).unwrap();
        assert_eq!(store.create(&petro()).unwrap(), 1);

        assert_eq!(metrics.snapshot().creates, 1);
    }

    #[test]
    fn open_store_on_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");
        let config = StoreConfig::new().rule_set(RuleSet::Custom);

        {
            let mut store = open_store(&config, BackendKind::File(path.clone())).unwrap();
            store.create(&petro()).unwrap();
        }

        let store = open_store(&config, BackendKind::File(path)).unwrap();
        assert_eq!(store.get_records().unwrap().len(), 1);
    }
}
