//! Read-fallback cache of the last successful listing.

use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::remote::TransportError;
use crate::storage::ports::{KeyValueStore, StorageResult};
use crate::storage::{LocalState, SessionTicket, StorageKey};
use crate::task::domain::{PageSize, Task, TaskPage};

/// Persisted copy of the last listing returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    /// Tasks in server order.
    pub tasks: Vec<Task>,
    /// When the listing was fetched.
    pub synced_at: DateTime<Utc>,
}

/// Cached listing served in place of a live one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFallback {
    /// The cached tasks presented as a complete result set.
    pub page: TaskPage,
    /// When the cache was written, if ever.
    pub synced_at: Option<DateTime<Utc>>,
    /// Time elapsed since `synced_at`.
    pub age: Option<TimeDelta>,
}

/// Freshness of the cached snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Staleness {
    /// When the cache was written, if ever.
    pub synced_at: Option<DateTime<Utc>>,
    /// Time elapsed since `synced_at`.
    pub age: Option<TimeDelta>,
    /// `true` after a fallback, until the next successful fetch.
    pub stale: bool,
}

/// Keeps the cached snapshot in step with successful fetches and serves it
/// when the remote service is unreachable.
///
/// There is no expiry: an old snapshot is still served, with its age.
pub struct CacheReconciler<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    local: LocalState<S>,
    clock: Arc<C>,
    stale: Mutex<bool>,
}

impl<S, C> CacheReconciler<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Creates a reconciler persisting through `local`.
    #[must_use]
    pub fn new(local: LocalState<S>, clock: Arc<C>) -> Self {
        Self {
            local,
            clock,
            stale: Mutex::new(false),
        }
    }

    /// Replaces the snapshot with `tasks` and marks it fresh.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store; the previous snapshot is then
    /// kept.
    pub async fn on_fetch_success(&self, tasks: &[Task]) -> StorageResult<()> {
        self.on_fetch_success_for(self.local.ticket(), tasks).await
    }

    /// Replaces the snapshot unless the session of `ticket` has ended.
    pub(crate) async fn on_fetch_success_for(
        &self,
        ticket: SessionTicket,
        tasks: &[Task],
    ) -> StorageResult<()> {
        let mut stale = self.stale.lock().await;
        let snapshot = CachedSnapshot {
            tasks: tasks.to_vec(),
            synced_at: self.clock.utc(),
        };
        if self
            .local
            .save_for(ticket, StorageKey::CachedTasks, &snapshot)
            .await?
        {
            *stale = false;
            tracing::debug!(count = tasks.len(), "cached task snapshot");
        }
        Ok(())
    }

    /// Serves the snapshot after a connectivity failure.
    ///
    /// The snapshot is returned as a full result set: `total` is its length,
    /// `skip` is zero and `limit` is the requested page size. A missing
    /// snapshot yields an empty page.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged when it is not a connectivity failure, or
    /// when the snapshot cannot be read.
    pub async fn on_fetch_failure(
        &self,
        error: TransportError,
        limit: PageSize,
    ) -> Result<CacheFallback, TransportError> {
        if !error.is_connectivity() {
            return Err(error);
        }
        let mut stale = self.stale.lock().await;
        let snapshot = match self.read().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, "cached snapshot unreadable; no fallback available");
                return Err(error);
            }
        };
        *stale = true;
        let synced_at = snapshot.as_ref().map(|cached| cached.synced_at);
        let tasks = snapshot.map(|cached| cached.tasks).unwrap_or_default();
        let total = u32::try_from(tasks.len()).unwrap_or(u32::MAX);
        tracing::info!(count = tasks.len(), "serving cached tasks while offline");
        Ok(CacheFallback {
            page: TaskPage {
                todos: tasks,
                total,
                skip: 0,
                limit: limit.value(),
            },
            synced_at,
            age: synced_at.map(|at| self.age_of(at)),
        })
    }

    /// Returns the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn snapshot(&self) -> StorageResult<Option<CachedSnapshot>> {
        self.read().await
    }

    /// Reports when the snapshot was taken and whether it is being served
    /// in place of live data.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn staleness(&self) -> StorageResult<Staleness> {
        let stale = *self.stale.lock().await;
        let synced_at = self.read().await?.map(|cached| cached.synced_at);
        Ok(Staleness {
            synced_at,
            age: synced_at.map(|at| self.age_of(at)),
            stale,
        })
    }

    async fn read(&self) -> StorageResult<Option<CachedSnapshot>> {
        self.local.load(StorageKey::CachedTasks).await
    }

    fn age_of(&self, synced_at: DateTime<Utc>) -> TimeDelta {
        self.clock.utc().signed_duration_since(synced_at)
    }
}
