//! Adapter implementations for the key-value storage port.

mod configured;
mod directory;
mod memory;

pub use configured::ConfiguredStore;
pub use directory::DirectoryKeyValueStore;
pub use memory::InMemoryKeyValueStore;
