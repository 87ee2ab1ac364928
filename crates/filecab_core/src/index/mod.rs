//! Secondary indexes for the in-memory store.
//!
//! Indexes map a normalized field value to the ids of the records that carry
//! it. They are maintained together with the record list by
//! [`crate::MemoryStore`] and are never persisted; the file store scans
//! instead.
//!
//! # Index Types
//!
//! - [`HashIndex`]: key to ordered id bucket, exact-match lookup
//! - [`IndexSet`]: the four indexes a store keeps (id, first name,
//!   last name, date of birth)

mod hash;
mod set;

pub use hash::HashIndex;
pub use set::{name_key, IndexSet};
