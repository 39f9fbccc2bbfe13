//! Durable local storage for the client.
//!
//! Everything the client persists between runs (auth token, user profile,
//! cached task snapshot and the offline queue) lives behind the
//! [`ports::KeyValueStore`] port. [`LocalState`] owns the fixed key
//! namespace and the JSON encoding of each value, so services never touch raw
//! keys or bytes.
//!
//! - Key namespace in [`keys`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod keys;
mod local_state;
pub mod ports;

pub use keys::StorageKey;
pub use local_state::{LocalState, SessionTicket};

#[cfg(test)]
mod tests;
