//! Transport adapters for the remote task service.
//!
//! [`HttpApiClient`] talks to the real service over HTTP; [`InMemoryRemote`]
//! is a fake with injectable failures. Both classify failures with
//! [`TransportError`].

mod error;
mod http;
mod memory;

pub use error::{STATUS_NOT_FOUND, STATUS_UNAUTHORIZED, TransportError, TransportResult};
pub use http::HttpApiClient;
pub use memory::InMemoryRemote;
