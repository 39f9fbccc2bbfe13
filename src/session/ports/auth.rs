//! Remote authentication port.

use crate::remote::TransportResult;
use crate::session::domain::{Credentials, ProfileUpdate, Session, SignupRequest, User};
use async_trait::async_trait;

/// Authentication endpoints of the remote service.
///
/// `me` and `update_me` act on behalf of the bearer token currently held by
/// the adapter; a rejected token is reported as HTTP 401.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a session.
    async fn login(&self, credentials: &Credentials) -> TransportResult<Session>;

    /// Creates an account and returns its first session.
    async fn signup(&self, request: &SignupRequest) -> TransportResult<Session>;

    /// Fetches the signed-in user's profile.
    async fn me(&self) -> TransportResult<User>;

    /// Updates the signed-in user's profile.
    async fn update_me(&self, update: &ProfileUpdate) -> TransportResult<User>;
}
