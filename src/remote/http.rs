//! HTTP transport for the remote service.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::{TransportError, TransportResult};
use crate::session::domain::{AuthToken, Credentials, ProfileUpdate, Session, SignupRequest, User};
use crate::session::ports::AuthApi;
use crate::storage::ports::KeyValueStore;
use crate::storage::{LocalState, StorageKey};
use crate::task::domain::{NewTask, Task, TaskId, TaskPage, TaskPatch, TaskQuery};
use crate::task::ports::TaskApi;

/// `reqwest`-backed client for the task and authentication endpoints.
///
/// The bearer token is read from [`LocalState`] on every request, so a
/// login or logout through the session service takes effect immediately.
pub struct HttpApiClient<S>
where
    S: KeyValueStore,
{
    http: Client,
    base_url: Url,
    local: LocalState<S>,
}

impl<S> HttpApiClient<S>
where
    S: KeyValueStore,
{
    /// Builds a client for `base_url` with a whole-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Connectivity`] when `base_url` cannot carry
    /// path segments or the HTTP client cannot be initialised.
    pub fn new(base_url: Url, timeout: Duration, local: LocalState<S>) -> TransportResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(TransportError::connectivity(format!(
                "base URL {base_url} cannot address endpoints"
            )));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| TransportError::connectivity(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            local,
        })
    }

    /// Returns the service base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> TransportResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| TransportError::connectivity("base URL cannot address endpoints"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn request(&self, method: Method, segments: &[&str]) -> TransportResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        let builder = self.http.request(method, url);
        match self.local.load::<AuthToken>(StorageKey::Token).await {
            Ok(Some(token)) => Ok(builder.bearer_auth(token.as_str())),
            Ok(None) => Ok(builder),
            Err(err) => {
                tracing::warn!(error = %err, "could not read stored token; sending unauthenticated request");
                Ok(builder)
            }
        }
    }

    async fn send_json<T>(&self, builder: RequestBuilder) -> TransportResult<T>
    where
        T: DeserializeOwned,
    {
        let response = dispatch(builder).await?;
        // A success status means the request took effect.
        response
            .json::<T>()
            .await
            .map_err(|err| TransportError::decode(err.to_string()))
    }
}

/// Sends the request and converts error statuses into
/// [`TransportError::Server`].
async fn dispatch(builder: RequestBuilder) -> TransportResult<Response> {
    let response = builder
        .send()
        .await
        .map_err(|err| TransportError::connectivity(err.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), "remote service returned an error status");
    Err(TransportError::server(status.as_u16(), error_message(&body)))
}

/// Extracts the first string `message` or `detail` field of an error body.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return String::new();
    };
    ["message", "detail"]
        .into_iter()
        .find_map(|field| value.get(field).and_then(serde_json::Value::as_str))
        .map(str::to_owned)
        .unwrap_or_default()
}

#[async_trait]
impl<S> TaskApi for HttpApiClient<S>
where
    S: KeyValueStore,
{
    async fn list(&self, query: &TaskQuery) -> TransportResult<TaskPage> {
        let builder = self
            .request(Method::GET, &["todos"])
            .await?
            .query(&query.query_pairs());
        self.send_json(builder).await
    }

    async fn get(&self, id: &TaskId) -> TransportResult<Task> {
        let builder = self.request(Method::GET, &["todos", id.as_str()]).await?;
        self.send_json(builder).await
    }

    async fn create(&self, task: &NewTask) -> TransportResult<Task> {
        let builder = self.request(Method::POST, &["todos"]).await?.json(task);
        self.send_json(builder).await
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TransportResult<Task> {
        let builder = self
            .request(Method::PUT, &["todos", id.as_str()])
            .await?
            .json(patch);
        self.send_json(builder).await
    }

    async fn delete(&self, id: &TaskId) -> TransportResult<()> {
        let builder = self.request(Method::DELETE, &["todos", id.as_str()]).await?;
        dispatch(builder).await.map(drop)
    }
}

#[async_trait]
impl<S> AuthApi for HttpApiClient<S>
where
    S: KeyValueStore,
{
    async fn login(&self, credentials: &Credentials) -> TransportResult<Session> {
        let builder = self
            .request(Method::POST, &["auth", "login"])
            .await?
            .json(credentials);
        self.send_json(builder).await
    }

    async fn signup(&self, request: &SignupRequest) -> TransportResult<Session> {
        let builder = self
            .request(Method::POST, &["auth", "signup"])
            .await?
            .json(request);
        self.send_json(builder).await
    }

    async fn me(&self) -> TransportResult<User> {
        let builder = self.request(Method::GET, &["auth", "me"]).await?;
        self.send_json(builder).await
    }

    async fn update_me(&self, update: &ProfileUpdate) -> TransportResult<User> {
        // The service reads the name from the query string; the body is kept
        // for servers that accept JSON.
        let builder = self
            .request(Method::PUT, &["auth", "me"])
            .await?
            .query(&[("name", update.name())])
            .json(update);
        self.send_json(builder).await
    }
}
