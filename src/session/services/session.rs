//! Login, signup, restore and logout over persisted local state.

use std::sync::Arc;
use thiserror::Error;

use crate::remote::{TransportError, TransportResult};
use crate::session::domain::{
    AuthToken, Credentials, ProfileUpdate, Session, SessionDomainError, SignupRequest, User,
};
use crate::session::ports::AuthApi;
use crate::storage::ports::{KeyValueStore, StorageError};
use crate::storage::{LocalState, StorageKey};

/// Errors returned by [`SessionService`].
#[derive(Debug, Clone, Error)]
pub enum SessionServiceError {
    /// Input was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] SessionDomainError),

    /// The remote service refused the request or answered unreadably.
    #[error(transparent)]
    Remote(#[from] TransportError),

    /// Local persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionServiceError {
    /// Returns `true` when the remote service rejected the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Remote(err) if err.is_unauthorized())
    }
}

/// Result type for session service operations.
pub type SessionServiceResult<T> = Result<T, SessionServiceError>;

/// Owns the persisted token and profile.
///
/// Any HTTP 401 clears every persisted key, including the task cache and
/// offline queue.
pub struct SessionService<A, S>
where
    A: AuthApi,
    S: KeyValueStore,
{
    api: Arc<A>,
    local: LocalState<S>,
}

impl<A, S> SessionService<A, S>
where
    A: AuthApi,
    S: KeyValueStore,
{
    /// Creates a session service.
    #[must_use]
    pub const fn new(api: Arc<A>, local: LocalState<S>) -> Self {
        Self { api, local }
    }

    /// Signs in and persists the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Validation`] for malformed credentials,
    /// [`SessionServiceError::Remote`] when the service refuses them, or
    /// [`SessionServiceError::Storage`] when the session cannot be saved.
    pub async fn login(&self, credentials: &Credentials) -> SessionServiceResult<Session> {
        credentials.validate()?;
        let session = self.guard(self.api.login(credentials).await).await?;
        self.persist(&session).await?;
        tracing::info!(user = %session.user.id, "signed in");
        Ok(session)
    }

    /// Creates an account and persists its session.
    ///
    /// # Errors
    ///
    /// Same as [`Self::login`].
    pub async fn signup(&self, request: &SignupRequest) -> SessionServiceResult<Session> {
        request.validate()?;
        let session = self.guard(self.api.signup(request).await).await?;
        self.persist(&session).await?;
        tracing::info!(user = %session.user.id, "account created");
        Ok(session)
    }

    /// Loads the persisted session. Returns `None` unless both token and
    /// profile are stored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Storage`] when either value cannot be
    /// read.
    pub async fn restore(&self) -> SessionServiceResult<Option<Session>> {
        let token = self.local.load::<AuthToken>(StorageKey::Token).await?;
        let user = self.local.load::<User>(StorageKey::User).await?;
        Ok(token.zip(user).map(|(token, user)| Session { token, user }))
    }

    /// Fetches the profile from the service and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Remote`] when the call fails, or
    /// [`SessionServiceError::Storage`] when the profile cannot be saved.
    pub async fn refresh_profile(&self) -> SessionServiceResult<User> {
        let user = self.guard(self.api.me().await).await?;
        self.local.save(StorageKey::User, &user).await?;
        Ok(user)
    }

    /// Renames the signed-in user and persists the returned profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Validation`] for an out-of-range name,
    /// otherwise the same as [`Self::refresh_profile`].
    pub async fn update_profile(&self, update: &ProfileUpdate) -> SessionServiceResult<User> {
        update.validate()?;
        let user = self.guard(self.api.update_me(update).await).await?;
        self.local.save(StorageKey::User, &user).await?;
        Ok(user)
    }

    /// Clears token, profile, cached tasks and the offline queue.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Storage`] when a key cannot be removed.
    pub async fn logout(&self) -> SessionServiceResult<()> {
        self.local.clear_all().await?;
        tracing::info!("signed out");
        Ok(())
    }

    async fn persist(&self, session: &Session) -> SessionServiceResult<()> {
        self.local.save(StorageKey::Token, &session.token).await?;
        self.local.save(StorageKey::User, &session.user).await?;
        Ok(())
    }

    /// Clears local state when `result` is an HTTP 401.
    async fn guard<T>(&self, result: TransportResult<T>) -> SessionServiceResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if err.is_unauthorized() => {
                tracing::warn!(error = %err, "session rejected; clearing local state");
                if let Err(clear_err) = self.local.clear_all().await {
                    tracing::error!(error = %clear_err, "could not clear local state");
                }
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }
}
