//! Port contracts for the task collection.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod remote;

pub use remote::TaskApi;
