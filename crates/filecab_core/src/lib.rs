//! # FileCab Core
//!
//! Record storage engine for FileCab.
//!
//! This crate provides:
//! - A validation pipeline driven by configurable rule sets
//! - [`MemoryStore`], a record list with secondary indexes and a query memo
//! - [`FileStore`], fixed-size binary slots with soft delete and purge
//! - Snapshots with CSV and XML import/export
//! - Metering and logging decorators over any [`RecordStore`]
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use filecab_core::{open_store, BackendKind, ParametersContainer, RecordStore, RuleSet, StoreConfig};
//! use rust_decimal::Decimal;
//!
//! let config = StoreConfig::new().rule_set(RuleSet::Custom);
//! let mut store = open_store(&config, BackendKind::Memory).unwrap();
//!
//! let id = store
//!     .create(&ParametersContainer::new(
//!         "Petro",
//!         "Semenov",
//!         NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
//!         21,
//!         Decimal::new(110030, 2),
//!         'A',
//!     ))
//!     .unwrap();
//! assert_eq!(id, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod decorator;
mod error;
pub mod file;
pub mod index;
mod memory;
mod metrics;
mod record;
mod snapshot;
mod store;
pub mod transfer;
mod validation;

pub use config::{open_store, BackendKind, StoreConfig};
pub use decorator::{LoggingStore, MeteredStore};
pub use error::{StoreError, StoreResult};
pub use file::{CompactionResult, FileStore, RECORD_SIZE};
pub use memory::MemoryStore;
pub use metrics::{MetricsSnapshot, Operation, StoreMetrics};
pub use record::{Field, ParametersContainer, Record, RecordIter, STATUS_DELETED, STATUS_LIVE};
pub use snapshot::{ImportReport, Snapshot};
pub use store::{RecordStore, RestoreReport, StoreStat};
pub use transfer::Format;
pub use validation::{Bounds, FieldValidator, RuleSet, ValidationError, ValidationRules, Validator};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
