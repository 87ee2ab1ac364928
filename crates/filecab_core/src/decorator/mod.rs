//! Store decorators.
//!
//! Both wrappers own an inner [`crate::RecordStore`] and forward every call,
//! so they stack in any order:
//!
//! ```text
//! LoggingStore<MeteredStore<FileStore>>
//! ```

mod logging;
mod metered;

pub use logging::LoggingStore;
pub use metered::MeteredStore;
