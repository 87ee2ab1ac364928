//! Store operation counters.
//!
//! # Usage
//!
//! ```rust
//! use filecab_core::{MemoryStore, MeteredStore, RecordStore};
//!
//! let store = MeteredStore::new(MemoryStore::default());
//! store.get_records().unwrap();
//!
//! let metrics = store.metrics().snapshot();
//! assert_eq!(metrics.reads, 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Operation kinds counted by [`StoreMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `create`
    Create,
    /// `edit`
    Edit,
    /// `insert`
    Insert,
    /// `remove`
    Remove,
    /// `purge`
    Purge,
    /// `get_records`, `get_stat` and `make_snapshot`
    Read,
    /// Any `find_by_*`
    Find,
    /// `restore`
    Restore,
}

impl Operation {
    /// Returns the operation name used in log events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Insert => "insert",
            Self::Remove => "remove",
            Self::Purge => "purge",
            Self::Read => "read",
            Self::Find => "find",
            Self::Restore => "restore",
        }
    }
}

/// Atomic per-operation counters.
///
/// Counters only increase and can be read while operations run.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    creates: AtomicU64,
    edits: AtomicU64,
    inserts: AtomicU64,
    removes: AtomicU64,
    purges: AtomicU64,
    reads: AtomicU64,
    finds: AtomicU64,
    restores: AtomicU64,
    errors: AtomicU64,
    elapsed_nanos: AtomicU64,
}

impl StoreMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one finished operation.
    pub(crate) fn record(&self, operation: Operation, elapsed: Duration, failed: bool) {
        let counter = match operation {
            Operation::Create => &self.creates,
            Operation::Edit => &self.edits,
            Operation::Insert => &self.inserts,
            Operation::Remove => &self.removes,
            Operation::Purge => &self.purges,
            Operation::Read => &self.reads,
            Operation::Find => &self.finds,
            Operation::Restore => &self.restores,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Returns how many times `operation` ran.
    pub fn count(&self, operation: Operation) -> u64 {
        match operation {
            Operation::Create => self.creates.load(Ordering::Relaxed),
            Operation::Edit => self.edits.load(Ordering::Relaxed),
            Operation::Insert => self.inserts.load(Ordering::Relaxed),
            Operation::Remove => self.removes.load(Ordering::Relaxed),
            Operation::Purge => self.purges.load(Ordering::Relaxed),
            Operation::Read => self.reads.load(Ordering::Relaxed),
            Operation::Find => self.finds.load(Ordering::Relaxed),
            Operation::Restore => self.restores.load(Ordering::Relaxed),
        }
    }

    /// Returns the number of failed operations.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Returns the time spent inside the wrapped store.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::Relaxed))
    }

    /// Returns a plain copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            creates: self.count(Operation::Create),
            edits: self.count(Operation::Edit),
            inserts: self.count(Operation::Insert),
            removes: self.count(Operation::Remove),
            purges: self.count(Operation::Purge),
            reads: self.count(Operation::Read),
            finds: self.count(Operation::Find),
            restores: self.count(Operation::Restore),
            errors: self.errors(),
            elapsed: self.elapsed(),
        }
    }
}

/// A point-in-time copy of [`StoreMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// `create` calls.
    pub creates: u64,
    /// `edit` calls.
    pub edits: u64,
    /// `insert` calls.
    pub inserts: u64,
    /// `remove` calls.
    pub removes: u64,
    /// `purge` calls.
    pub purges: u64,
    /// Full reads.
    pub reads: u64,
    /// `find_by_*` calls.
    pub finds: u64,
    /// `restore` calls.
    pub restores: u64,
    /// Calls that returned an error.
    pub errors: u64,
    /// Total time spent in the wrapped store.
    pub elapsed: Duration,
}

impl MetricsSnapshot {
    /// Returns the total number of calls.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.creates
            + self.edits
            + self.inserts
            + self.removes
            + self.purges
            + self.reads
            + self.finds
            + self.restores
    }
}
