//! Composition root wiring configuration to the services.

use mockable::DefaultClock;
use std::sync::Arc;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::remote::{HttpApiClient, TransportError};
use crate::session::services::SessionService;
use crate::storage::LocalState;
use crate::storage::adapters::ConfiguredStore;
use crate::storage::ports::StorageError;
use crate::task::services::{TaskStore, TaskStoreResult};

/// HTTP client over the configured store.
pub type ConfiguredApi = HttpApiClient<ConfiguredStore>;

/// Session service as assembled by [`TodoClient::open`].
pub type ConfiguredSession = SessionService<ConfiguredApi, ConfiguredStore>;

/// Task store as assembled by [`TodoClient::open`].
pub type ConfiguredTaskStore = TaskStore<ConfiguredApi, ConfiguredStore, DefaultClock>;

/// Errors raised while assembling the client.
#[derive(Debug, Error)]
pub enum ClientInitError {
    /// The local store could not be opened.
    #[error("failed to open local storage: {0}")]
    Storage(#[from] StorageError),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Transport(#[from] TransportError),
}

/// Session and task services sharing one store and one HTTP client.
pub struct TodoClient {
    session: ConfiguredSession,
    tasks: ConfiguredTaskStore,
    local: LocalState<ConfiguredStore>,
}

impl TodoClient {
    /// Opens storage and builds the services described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientInitError`] when the storage directory cannot be
    /// opened or the base URL is unusable.
    pub fn open(config: &ClientConfig) -> Result<Self, ClientInitError> {
        let store = ConfiguredStore::open(config.storage_dir.as_deref())?;
        if !store.is_durable() {
            tracing::warn!("no storage directory configured; state will not survive a restart");
        }
        let local = LocalState::new(Arc::new(store));
        let api = Arc::new(HttpApiClient::new(
            config.api_url.clone(),
            config.timeout,
            local.clone(),
        )?);
        tracing::info!(api_url = %config.api_url, "client assembled");
        Ok(Self {
            session: SessionService::new(Arc::clone(&api), local.clone()),
            tasks: TaskStore::new(api, local.clone(), Arc::new(DefaultClock), config.page_size),
            local,
        })
    }

    /// Returns the session service.
    #[must_use]
    pub const fn session(&self) -> &ConfiguredSession {
        &self.session
    }

    /// Returns the task store.
    #[must_use]
    pub const fn tasks(&self) -> &ConfiguredTaskStore {
        &self.tasks
    }

    /// Signs out: clears every persisted key and resets the task
    /// projection.
    ///
    /// A task operation still in flight is not waited for; its result is
    /// neither persisted nor shown.
    ///
    /// # Errors
    ///
    /// Returns the storage failure when a key cannot be removed.
    pub async fn logout(&self) -> TaskStoreResult<()> {
        self.tasks.end_session().await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// Returns the shared persisted state.
    #[must_use]
    pub const fn local_state(&self) -> &LocalState<ConfiguredStore> {
        &self.local
    }
}
