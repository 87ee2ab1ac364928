//! Binary file store.
//!
//! Records live in fixed-size slots (see [`slot`]) appended to a single file.
//! Deletes are soft; [`compaction`] reclaims their space. The highest id a
//! purge may drop is kept in a [`watermark`] file beside the slots.

pub mod compaction;
pub mod slot;
mod store;
pub mod watermark;

pub use compaction::CompactionResult;
pub use slot::{RECORD_SIZE, STATUS_PENDING};
pub use store::FileStore;
pub use watermark::IdWatermark;
