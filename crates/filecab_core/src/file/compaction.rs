//! Slot compaction.
//!
//! Purge walks the file once, copying every live slot forward over the gaps
//! left by deleted and corrupt slots, then truncates the tail.
//!
//! ## Invariants
//!
//! - Purge **MUST NOT** change the set of live records or their ids
//! - Live slots keep their relative order
//! - The file ends exactly after the last live slot

use crate::error::StoreResult;
use crate::file::slot::{self, slot_offset, RECORD_SIZE};
use filecab_storage::StorageBackend;
use std::collections::HashMap;
use tracing::warn;

/// Result of a compaction pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionResult {
    /// Slots in the file before the pass, a trailing partial slot included.
    pub input_slots: u64,
    /// Slots left after the pass.
    pub output_slots: u64,
    /// Deleted slots dropped.
    pub deleted_removed: usize,
    /// Corrupt or pending slots dropped.
    pub corrupt_removed: usize,
    /// Bytes reclaimed.
    pub bytes_saved: u64,
}

impl CompactionResult {
    /// Returns every slot the pass dropped.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.deleted_removed + self.corrupt_removed
    }
}

/// Compacts the slots of `backend` in place.
///
/// Returns the new id to slot map alongside the statistics.
pub(crate) fn compact<B: StorageBackend>(
    backend: &mut B,
) -> StoreResult<(HashMap<i32, u64>, CompactionResult)> {
    let input_size = backend.size()?;
    let record_size = RECORD_SIZE as u64;
    let input_slots = input_size.div_ceil(record_size);

    let mut slots = HashMap::new();
    let mut result = CompactionResult {
        input_slots,
        ..CompactionResult::default()
    };
    let mut next = 0u64;

    for index in 0..input_slots {
        let offset = slot_offset(index);
        let len = (input_size - offset).min(record_size) as usize;
        let bytes = backend.read_at(offset, len)?;

        match slot::decode(index, &bytes) {
            Ok(record) if !record.is_deleted() => {
                if next != index {
                    backend.write_at(slot_offset(next), &bytes)?;
                }
                slots.insert(record.id(), next);
                next += 1;
            }
            Ok(_) => result.deleted_removed += 1,
            Err(err) => {
                warn!(slot = index, error = %err, "dropping corrupt slot");
                result.corrupt_removed += 1;
            }
        }
    }

    let output_size = slot_offset(next);
    backend.truncate(output_size)?;
    backend.sync()?;

    result.output_slots = next;
    result.bytes_saved = input_size - output_size;
    Ok((slots, result))
}
