//! Shared harness for offline sync integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use todosync::remote::InMemoryRemote;
use todosync::session::domain::SignupRequest;
use todosync::session::services::SessionService;
use todosync::storage::LocalState;
use todosync::storage::adapters::InMemoryKeyValueStore;
use todosync::task::domain::PageSize;
use todosync::task::services::TaskStore;

/// Task store wired to the in-memory server and store.
pub type TestTaskStore = TaskStore<InMemoryRemote, InMemoryKeyValueStore, DefaultClock>;

/// Session service wired to the in-memory server and store.
pub type TestSession = SessionService<InMemoryRemote, InMemoryKeyValueStore>;

/// Services sharing one fake server and one local store.
pub struct Client {
    /// Control handle over the fake server.
    pub remote: InMemoryRemote,
    /// Persisted client state.
    pub local: LocalState<InMemoryKeyValueStore>,
    /// Session service.
    pub session: TestSession,
    /// Task store.
    pub tasks: TestTaskStore,
}

/// Provides a client with no signed-in user.
#[fixture]
pub fn client() -> Client {
    let remote = InMemoryRemote::default();
    let local = LocalState::new(Arc::new(InMemoryKeyValueStore::new()));
    let api = Arc::new(remote.clone());
    Client {
        session: SessionService::new(Arc::clone(&api), local.clone()),
        tasks: TaskStore::new(api, local.clone(), Arc::new(DefaultClock), PageSize::default()),
        remote,
        local,
    }
}

/// Signs up a user so task requests are authenticated.
///
/// # Errors
///
/// Returns an error when the signup is refused.
pub async fn signed_in(client: &Client) -> eyre::Result<()> {
    let request = SignupRequest::new("Ada Lovelace", "ada@example.com", "analytical");
    client.session.signup(&request).await?;
    Ok(())
}
