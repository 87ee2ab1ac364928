//! Storage backend trait definition.

use crate::error::StorageResult;

/// A random-access byte store.
///
/// The record file is a flat array of fixed-size slots, so the backend must
/// support positional writes in addition to appends. Writing past the current
/// end grows the storage; any gap is zero-filled.
///
/// # Invariants
///
/// - `write_at` followed by `read_at` over the same range returns the written bytes
/// - `size` is one past the highest byte ever written (minus truncation)
/// - `append` writes at `size()` and returns that offset
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range extends past
    /// the current size, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Writes `data` at `offset`, growing the storage if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()>;

    /// Appends data to the end of the storage.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size()?;
        self.write_at(offset, data)?;
        Ok(offset)
    }

    /// Flushes buffered writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Returns the current size of the storage in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Syncs data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Shrinks the storage to `new_size` bytes.
    ///
    /// Used by purge after live slots have been packed to the front.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::TruncateBeyondEnd`] if `new_size` is
    /// greater than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;
}
