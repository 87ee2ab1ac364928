//! Cabinet file backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A backend over one cabinet file on disk.
///
/// The file has no header, so its length is the slot count times the slot
/// size plus whatever partial tail a crash left behind. The length is cached
/// and kept current by `write_at` and `truncate`.
///
/// ```no_run
/// use filecab_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("cabinet.db")).unwrap();
/// backend.write_at(0, &[0u8; 278]).unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    len: RwLock<u64>,
}

impl FileBackend {
    /// Opens the cabinet file at `path`, creating it and any missing parent
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory or the file cannot be created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            len: RwLock::new(len),
        })
    }

    /// Returns the cabinet file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let size = *self.len.read();
        if offset.saturating_add(len as u64) > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        let mut buffer = vec![0u8; len];
        if len > 0 {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buffer)?;
        }
        Ok(buffer)
    }

    fn write_at(&mut self, offset: u64, data: &[u8]) -> StorageResult<()> {
        if data.is_empty() {
            return Ok(());
        }
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(data)?;

        let mut len = self.len.write();
        *len = (*len).max(offset + data.len() as u64);
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.lock().flush()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.len.read())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.lock().sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut len = self.len.write();
        if new_size > *len {
            return Err(StorageError::TruncateBeyondEnd {
                requested: new_size,
                size: *len,
            });
        }

        let file = self.file.lock();
        file.set_len(new_size)?;
        file.sync_all()?;
        *len = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SLOT: usize = 8;

    fn slot(fill: u8) -> [u8; SLOT] {
        [fill; SLOT]
    }

    fn offset(index: u64) -> u64 {
        index * SLOT as u64
    }

    #[test]
    fn new_cabinet_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");

        let backend = FileBackend::open(&path).unwrap();

        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn opens_inside_missing_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("office").join("2024").join("cabinet.db");

        let backend = FileBackend::open(&path).unwrap();

        assert_eq!(backend.path(), path);
    }

    #[test]
    fn status_rewrite_leaves_rest_of_slot() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("cabinet.db")).unwrap();
        for index in 0..3 {
            backend.write_at(offset(index), &slot(b'a' + index as u8)).unwrap();
        }

        backend.write_at(offset(1), &[0xFF, 0x7F]).unwrap();

        assert_eq!(backend.size().unwrap(), offset(3));
        assert_eq!(backend.read_at(offset(0), SLOT).unwrap(), slot(b'a'));
        assert_eq!(backend.read_at(offset(1), SLOT).unwrap(), b"\xFF\x7Fbbbbbb");
        assert_eq!(backend.read_at(offset(2), SLOT).unwrap(), slot(b'c'));
    }

    #[test]
    fn reading_a_partial_tail_slot_fails() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("cabinet.db")).unwrap();
        backend.write_at(offset(0), &slot(1)).unwrap();
        backend.write_at(offset(1), &slot(2)[..3]).unwrap();

        assert_eq!(backend.read_at(offset(1), 3).unwrap(), vec![2; 3]);
        assert!(matches!(
            backend.read_at(offset(1), SLOT),
            Err(StorageError::ReadPastEnd { size, .. }) if size == offset(1) + 3
        ));
    }

    #[test]
    fn purge_shrinks_to_packed_slots() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");
        let mut backend = FileBackend::open(&path).unwrap();
        for index in 0..4 {
            backend.write_at(offset(index), &slot(index as u8)).unwrap();
        }

        // Pack slots 1 and 3 to the front, then drop the tail.
        let second = backend.read_at(offset(1), SLOT).unwrap();
        let fourth = backend.read_at(offset(3), SLOT).unwrap();
        backend.write_at(offset(0), &second).unwrap();
        backend.write_at(offset(1), &fourth).unwrap();
        backend.truncate(offset(2)).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), offset(2));
        assert_eq!(backend.read_at(0, 2 * SLOT).unwrap(), [slot(1), slot(3)].concat());
        assert!(matches!(
            backend.truncate(offset(3)),
            Err(StorageError::TruncateBeyondEnd { .. })
        ));
    }

    #[test]
    fn slots_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cabinet.db");
        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.write_at(offset(0), &slot(7)).unwrap();
            backend.write_at(offset(1), &slot(9)).unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();

        assert_eq!(backend.size().unwrap(), offset(2));
        assert_eq!(backend.read_at(offset(1), SLOT).unwrap(), slot(9));
    }
}
