//! # FileCab Storage
//!
//! Random-access byte stores used underneath the FileCab binary record file.
//!
//! Backends do not interpret the bytes they hold. The slot layout, status
//! flags and compaction rules all live in `filecab_core`; a backend only
//! knows how to read and write ranges, report its size and shrink.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and throwaway cabinets
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use filecab_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.write_at(4, b"slot").unwrap();
//! assert_eq!(backend.size().unwrap(), 8);
//! assert_eq!(backend.read_at(0, 8).unwrap(), b"\0\0\0\0slot");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
