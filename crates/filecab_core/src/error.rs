//! Error types for FileCab stores.

use crate::validation::ValidationError;
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in FileCab store operations.
///
/// A duplicate id on `insert` is not an error: it is reported as a `false`
/// return so that bulk loads can keep going.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] filecab_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A field is outside the bounds of the active rule set.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No live record has the requested id.
    #[error("record #{id} not found")]
    NotFound {
        /// The id that was looked up.
        id: i32,
    },

    /// An argument is malformed independent of any rule set.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// One slot of the record file could not be decoded.
    #[error("corrupt record in slot {slot}: {reason}")]
    CorruptRecord {
        /// Zero-based slot index.
        slot: u64,
        /// Why decoding failed.
        reason: String,
    },

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// XML reading or writing failed.
    #[error("XML error: {message}")]
    Xml {
        /// Description of the failure.
        message: String,
    },

    /// Configuration could not be loaded.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(id: i32) -> Self {
        Self::NotFound { id }
    }

    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a corrupt record error.
    pub fn corrupt_record(slot: u64, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            slot,
            reason: reason.into(),
        }
    }

    /// Creates an XML error.
    pub fn xml(message: impl ToString) -> Self {
        Self::Xml {
            message: message.to_string(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the error is local to one record and a bulk
    /// operation may skip it.
    #[must_use]
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::CorruptRecord { .. } | Self::InvalidArgument { .. }
        )
    }
}
