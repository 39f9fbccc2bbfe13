//! Application services for session management.

mod session;

pub use session::{SessionService, SessionServiceError, SessionServiceResult};
