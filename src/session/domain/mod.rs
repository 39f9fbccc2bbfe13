//! Domain model for authenticated sessions.
//!
//! Request types validate locally so that malformed input never reaches the
//! network.

mod error;
mod requests;
mod session;
mod validation;

pub use error::SessionDomainError;
pub use requests::{Credentials, ProfileUpdate, SignupRequest};
pub use session::{AuthToken, Session, User};
pub use validation::{
    NAME_MAX_CHARS, NAME_MIN_CHARS, PASSWORD_MAX_CHARS, PASSWORD_MIN_CHARS, is_valid_email,
};
