//! Field rules shared by the session request types.

use super::SessionDomainError;

/// Shortest accepted password.
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Longest accepted password on signup.
pub const PASSWORD_MAX_CHARS: usize = 100;

/// Shortest accepted display name.
pub const NAME_MIN_CHARS: usize = 2;

/// Longest accepted display name.
pub const NAME_MAX_CHARS: usize = 50;

/// Returns `true` for addresses shaped like `local@domain.tld`.
///
/// Whitespace is rejected anywhere, exactly one `@` is allowed and the
/// domain needs a dot with text on both sides.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && !domain.contains('@') && domain.trim_matches('.').contains('.')
}

pub(super) fn check_email(email: &str) -> Result<(), SessionDomainError> {
    if email.trim().is_empty() {
        return Err(SessionDomainError::EmptyEmail);
    }
    if !is_valid_email(email) {
        return Err(SessionDomainError::InvalidEmail);
    }
    Ok(())
}

pub(super) fn check_password(password: &str, max: Option<usize>) -> Result<(), SessionDomainError> {
    let length = password.chars().count();
    if length < PASSWORD_MIN_CHARS {
        return Err(SessionDomainError::PasswordTooShort {
            min: PASSWORD_MIN_CHARS,
        });
    }
    if let Some(limit) = max
        && length > limit
    {
        return Err(SessionDomainError::PasswordTooLong { max: limit });
    }
    Ok(())
}

pub(super) fn check_name(name: &str) -> Result<(), SessionDomainError> {
    let length = name.trim().chars().count();
    if length < NAME_MIN_CHARS {
        return Err(SessionDomainError::NameTooShort {
            min: NAME_MIN_CHARS,
        });
    }
    if length > NAME_MAX_CHARS {
        return Err(SessionDomainError::NameTooLong {
            max: NAME_MAX_CHARS,
        });
    }
    Ok(())
}
