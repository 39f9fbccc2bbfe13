//! Port contracts for session management.

pub mod auth;

pub use auth::AuthApi;
