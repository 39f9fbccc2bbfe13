//! Shared world state for offline sync BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use todosync::remote::InMemoryRemote;
use todosync::session::services::SessionService;
use todosync::storage::LocalState;
use todosync::storage::adapters::InMemoryKeyValueStore;
use todosync::task::domain::{PageSize, Task};
use todosync::task::services::{FetchOutcome, Mutation, ReplayReport, TaskStore, TaskStoreResult};

/// Task store type used by the BDD world.
pub type TestTaskStore = TaskStore<InMemoryRemote, InMemoryKeyValueStore, DefaultClock>;

/// Scenario world for offline sync behaviour tests.
pub struct OfflineWorld {
    pub remote: InMemoryRemote,
    pub local: LocalState<InMemoryKeyValueStore>,
    pub session: SessionService<InMemoryRemote, InMemoryKeyValueStore>,
    pub tasks: TestTaskStore,
    pub last_mutation: Option<TaskStoreResult<Mutation<Task>>>,
    pub last_fetch: Option<TaskStoreResult<FetchOutcome>>,
    pub last_report: Option<ReplayReport>,
}

impl OfflineWorld {
    /// Creates a world with a reachable server and empty local state.
    #[must_use]
    pub fn new() -> Self {
        let remote = InMemoryRemote::default();
        let local = LocalState::new(Arc::new(InMemoryKeyValueStore::new()));
        let api = Arc::new(remote.clone());
        Self {
            session: SessionService::new(Arc::clone(&api), local.clone()),
            tasks: TaskStore::new(api, local.clone(), Arc::new(DefaultClock), PageSize::default()),
            remote,
            local,
            last_mutation: None,
            last_fetch: None,
            last_report: None,
        }
    }
}

impl Default for OfflineWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OfflineWorld {
    OfflineWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
