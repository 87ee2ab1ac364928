//! In-memory backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::RwLock;

/// A cabinet image held in a `Vec<u8>`.
///
/// Backs throwaway stores and lets tests build byte images directly, such as
/// a slot left pending by a crash or a truncated tail.
///
/// ```rust
/// use filecab_storage::{InMemoryBackend, StorageBackend};
///
/// let mut backend = InMemoryBackend::with_data(vec![0u8; 278]);
/// backend.write_at(0, &1i16.to_le_bytes()).unwrap();
/// assert_eq!(backend.read_at(0, 2).unwrap(), [1, 0]);
/// assert_eq!(backend.size().unwrap(), 278);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<Vec<u8>>,
}

impl InMemoryBackend {
    /// Creates an empty image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing byte image.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Returns a copy of the image.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.data.read().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.data.read();
        let size = data.len() as u64;
        match usize::try_from(offset) {
            Ok(start) if offset.saturating_add(len as u64) <= size => {
                Ok(data[start..start + len].to_vec())
            }
            _ => Err(StorageError::ReadPastEnd { offset, len, size }),
        }
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> StorageResult<()> {
        let start = usize::try_from(offset).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "offset exceeds memory")
        })?;
        let end = start + bytes.len();

        let mut data = self.data.write();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.data.read().len() as u64)
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.data.write();
        let size = data.len() as u64;
        if new_size > size {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }
        data.truncate(new_size as usize);
        Ok(())
    }
}
