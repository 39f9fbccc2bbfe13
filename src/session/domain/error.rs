//! Validation errors for session requests.

use thiserror::Error;

/// Errors raised while validating session inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionDomainError {
    /// Email was blank.
    #[error("email is required")]
    EmptyEmail,

    /// Email was not of the form `local@domain.tld`.
    #[error("invalid email address")]
    InvalidEmail,

    /// Password shorter than the minimum.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum accepted length.
        min: usize,
    },

    /// Password longer than the maximum.
    #[error("password must be less than {max} characters")]
    PasswordTooLong {
        /// Maximum accepted length.
        max: usize,
    },

    /// Display name shorter than the minimum.
    #[error("name must be at least {min} characters")]
    NameTooShort {
        /// Minimum accepted length.
        min: usize,
    },

    /// Display name longer than the maximum.
    #[error("name must be less than {max} characters")]
    NameTooLong {
        /// Maximum accepted length.
        max: usize,
    },

    /// Token was blank.
    #[error("authentication token must not be empty")]
    EmptyToken,
}
