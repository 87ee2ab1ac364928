//! Highest issued id, kept beside the slot file.
//!
//! Purge drops deleted slots, so a removed top id would otherwise vanish
//! from the file and be handed out again after the next open. The watermark
//! file holds that id as four little-endian bytes and is rewritten after
//! each purge through a temporary file and a rename.

use crate::error::StoreResult;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const SUFFIX: &str = ".ids";
const TEMP_SUFFIX: &str = ".ids.tmp";

/// The id watermark of one store file.
#[derive(Debug, Clone)]
pub struct IdWatermark {
    path: PathBuf,
    temp_path: PathBuf,
}

impl IdWatermark {
    /// Returns the watermark belonging to the store file at `store_path`.
    #[must_use]
    pub fn for_store(store_path: &Path) -> Self {
        Self {
            path: with_suffix(store_path, SUFFIX),
            temp_path: with_suffix(store_path, TEMP_SUFFIX),
        }
    }

    /// Returns the watermark file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored id, or `None` if there is no usable watermark.
    ///
    /// A malformed file is logged and ignored; the slot scan still bounds
    /// new ids from below.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing file cannot be read.
    pub fn load(&self) -> StoreResult<Option<i32>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        match <[u8; 4]>::try_from(data.as_slice()) {
            Ok(bytes) => Ok(Some(i32::from_le_bytes(bytes))),
            Err(_) => {
                warn!(path = %self.path.display(), len = data.len(), "ignoring malformed id watermark");
                Ok(None)
            }
        }
    }

    /// Stores `last_id` atomically.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be written or renamed.
    pub fn save(&self, last_id: i32) -> StoreResult<()> {
        let mut file = File::create(&self.temp_path)?;
        file.write_all(&last_id.to_le_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;
        Ok(())
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
