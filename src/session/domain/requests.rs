//! Login, signup and profile-update payloads.

use super::SessionDomainError;
use super::validation::{PASSWORD_MAX_CHARS, check_email, check_name, check_password};
use serde::Serialize;
use std::fmt;

/// Login payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Creates a login payload. The email is trimmed.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_owned(),
            password: password.into(),
        }
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Checks the email shape and the minimum password length.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`SessionDomainError`].
    pub fn validate(&self) -> Result<(), SessionDomainError> {
        check_email(&self.email)?;
        check_password(&self.password, None)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account creation payload.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    name: String,
    email: String,
    password: String,
}

impl SignupRequest {
    /// Creates a signup payload. Name and email are trimmed.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_owned(),
            email: email.into().trim().to_owned(),
            password: password.into(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Checks name, email and password bounds.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`SessionDomainError`].
    pub fn validate(&self) -> Result<(), SessionDomainError> {
        check_name(&self.name)?;
        check_email(&self.email)?;
        check_password(&self.password, Some(PASSWORD_MAX_CHARS))
    }

    /// Returns the login payload matching this account.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Profile update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    name: String,
}

impl ProfileUpdate {
    /// Creates a profile update. The name is trimmed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_owned(),
        }
    }

    /// Returns the new display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks the name bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::NameTooShort`] or
    /// [`SessionDomainError::NameTooLong`].
    pub fn validate(&self) -> Result<(), SessionDomainError> {
        check_name(&self.name)
    }
}
