//! Authenticated user profile and bearer token.

use super::SessionDomainError;
use crate::task::domain::UserId;
use crate::task::domain::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-issued identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Account creation timestamp.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Opaque bearer token. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuthToken(String);

impl AuthToken {
    /// Wraps a token issued by the server.
    ///
    /// # Errors
    ///
    /// Returns [`SessionDomainError::EmptyToken`] for a blank token.
    pub fn new(value: impl Into<String>) -> Result<Self, SessionDomainError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(SessionDomainError::EmptyToken);
        }
        Ok(Self(raw))
    }

    /// Returns the raw token for the `Authorization` header.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

impl TryFrom<String> for AuthToken {
    type Error = SessionDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AuthToken> for String {
    fn from(value: AuthToken) -> Self {
        value.0
    }
}

/// A signed-in session: token plus profile.
///
/// This is also the wire shape of the login and signup responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token.
    pub token: AuthToken,
    /// Signed-in user.
    pub user: User,
}
