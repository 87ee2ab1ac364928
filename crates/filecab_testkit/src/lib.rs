//! # FileCab Testkit
//!
//! Test utilities for FileCab.
//!
//! This crate provides:
//! - Record fixtures and temporary file stores
//! - Property-based test generators using proptest
//! - A differential harness that drives the memory and file stores in lockstep
//!
//! ## Usage
//!
//! ```rust
//! use filecab_testkit::prelude::*;
//! use filecab_core::{RecordStore, RuleSet};
//!
//! let mut store = TempFileStore::new(RuleSet::Custom);
//! assert_eq!(store.create(&petro()).unwrap(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
