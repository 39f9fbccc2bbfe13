//! Authenticated session management.
//!
//! The session is a bearer token plus the user's profile, persisted through
//! [`crate::storage::LocalState`] until logout or until the remote service
//! answers HTTP 401.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
