//! Port contracts for durable local storage.

pub mod key_value;

pub use key_value::{KeyValueStore, StorageError, StorageResult};
