//! Observable projection of the task collection.

use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, watch};

use super::cache::CacheReconciler;
use super::sync_queue::{ReplayReport, SyncQueue};
use crate::remote::TransportError;
use crate::storage::{LocalState, SessionTicket};
use crate::storage::ports::{KeyValueStore, StorageError};
use crate::task::domain::{
    NewTask, OperationKind, PageSize, Pagination, PendingOperation, Task, TaskAnalytics,
    TaskDomainError, TaskFilter, TaskId, TaskPage, TaskPatch, TaskQuery,
};
use crate::task::ports::TaskApi;

/// Status line shown while a mutation waits in the offline queue.
pub const OFFLINE_QUEUED_MESSAGE: &str = "Offline - will sync when online";

/// Where the current task list came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    /// Fetched from the remote service.
    #[default]
    Live,
    /// Served from the cached snapshot.
    Cache,
}

/// Result of the most recent mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The remote service accepted the mutation.
    Succeeded,
    /// The service was unreachable; the mutation waits in the queue.
    OfflineQueued,
    /// The mutation was refused.
    Failed,
}

/// Kind and result of the most recent mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    /// Which mutation ran.
    pub kind: OperationKind,
    /// How it ended.
    pub outcome: MutationOutcome,
}

/// Snapshot of the store observed by readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskStoreState {
    /// Tasks in server order.
    pub tasks: Vec<Task>,
    /// Filter applied when a fetch does not name one.
    pub filter: TaskFilter,
    /// Server-reported cursor.
    pub pagination: Pagination,
    /// `true` while a fetch, create, update or delete is in flight.
    pub loading: bool,
    /// Message of the last failure, cleared when the next operation starts.
    pub error: Option<String>,
    /// Most recent mutation, if any.
    pub last_mutation: Option<MutationRecord>,
    /// Origin of `tasks`.
    pub source: DataSource,
    /// When the cached tasks were fetched, while serving from cache.
    pub cached_at: Option<DateTime<Utc>>,
}

impl TaskStoreState {
    fn initial(page_size: PageSize) -> Self {
        Self {
            tasks: Vec::new(),
            filter: TaskFilter::new(),
            pagination: Pagination::with_limit(page_size),
            loading: false,
            error: None,
            last_mutation: None,
            source: DataSource::Live,
            cached_at: None,
        }
    }

    /// Returns the line to show the user: the last error, or the offline
    /// notice after a queued mutation.
    #[must_use]
    pub fn status_message(&self) -> Option<&str> {
        self.error.as_deref().or_else(|| {
            self.last_mutation
                .filter(|record| record.outcome == MutationOutcome::OfflineQueued)
                .map(|_| OFFLINE_QUEUED_MESSAGE)
        })
    }
}

/// Result of a mutation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<T> {
    /// The remote service applied the mutation.
    Applied(T),
    /// The mutation was queued for replay.
    Queued,
}

impl<T> Mutation<T> {
    /// Returns `true` when the mutation was queued.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }

    /// Returns the applied value, or `None` when the mutation was queued.
    #[must_use]
    pub fn into_applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Queued => None,
        }
    }
}

/// Listing parameters. Unset fields fall back to the store's current filter
/// and pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchRequest {
    filter: Option<TaskFilter>,
    skip: Option<u32>,
    limit: Option<PageSize>,
}

impl FetchRequest {
    /// Creates a request that reuses the store's current parameters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            filter: None,
            skip: None,
            limit: None,
        }
    }

    /// Overrides the filter for this fetch.
    #[must_use]
    pub const fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Overrides the offset.
    #[must_use]
    pub const fn with_skip(mut self, skip: u32) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Overrides the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: PageSize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A completed listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The page now held by the store.
    pub page: TaskPage,
    /// Origin of the page.
    pub source: DataSource,
    /// When a cached page was fetched.
    pub cached_at: Option<DateTime<Utc>>,
}

/// Errors returned by [`TaskStore`] operations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// Input was rejected before any network call.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// The remote service refused the request or answered unreadably.
    #[error(transparent)]
    Remote(#[from] TransportError),

    /// Local persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl TaskStoreError {
    /// Returns `true` when the remote service rejected the session.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Remote(err) if err.is_unauthorized())
    }
}

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Coordinates the remote service, offline queue and cache behind a single
/// observable state.
///
/// Operations are serialized; readers see the last committed
/// [`TaskStoreState`] through [`Self::snapshot`] or [`Self::subscribe`]
/// while a call is in flight. Results of calls that began before the local
/// state was cleared are dropped, and the projection is reset.
pub struct TaskStore<A, S, C>
where
    A: TaskApi,
    S: KeyValueStore,
    C: Clock,
{
    api: Arc<A>,
    local: LocalState<S>,
    queue: SyncQueue<S>,
    cache: CacheReconciler<S, C>,
    clock: Arc<C>,
    page_size: PageSize,
    state: watch::Sender<TaskStoreState>,
    session: watch::Sender<SessionTicket>,
    writer: Mutex<()>,
}

impl<A, S, C> TaskStore<A, S, C>
where
    A: TaskApi,
    S: KeyValueStore,
    C: Clock,
{
    /// Creates a store with an empty projection.
    #[must_use]
    pub fn new(api: Arc<A>, local: LocalState<S>, clock: Arc<C>, page_size: PageSize) -> Self {
        let (state, _) = watch::channel(TaskStoreState::initial(page_size));
        let (session, _) = watch::channel(local.ticket());
        Self {
            api,
            queue: SyncQueue::new(local.clone()),
            cache: CacheReconciler::new(local.clone(), Arc::clone(&clock)),
            local,
            clock,
            page_size,
            state,
            session,
            writer: Mutex::new(()),
        }
    }

    /// Returns the last committed state.
    #[must_use]
    pub fn snapshot(&self) -> TaskStoreState {
        self.follow_session();
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskStoreState> {
        self.state.subscribe()
    }

    /// Returns the offline queue.
    #[must_use]
    pub const fn queue(&self) -> &SyncQueue<S> {
        &self.queue
    }

    /// Returns the cache reconciler.
    #[must_use]
    pub const fn cache(&self) -> &CacheReconciler<S, C> {
        &self.cache
    }

    /// Fetches a page of tasks.
    ///
    /// On a connectivity failure the cached snapshot is served instead and
    /// the outcome reports [`DataSource::Cache`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Remote`] for any other failure; the held
    /// tasks are then left unchanged.
    pub async fn fetch(&self, request: FetchRequest) -> TaskStoreResult<FetchOutcome> {
        let _writer = self.writer.lock().await;
        let ticket = self.follow_session();
        let query = self.resolve(request);
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        match self.api.list(&query).await {
            Ok(page) => {
                if let Err(err) = self.cache.on_fetch_success_for(ticket, &page.todos).await {
                    tracing::warn!(error = %err, "could not update cached snapshot");
                }
                self.commit_page(ticket, &page, DataSource::Live, None);
                Ok(FetchOutcome {
                    page,
                    source: DataSource::Live,
                    cached_at: None,
                })
            }
            Err(err) if err.is_unauthorized() => Err(self.fail_unauthorized(err).await),
            Err(err) => match self.cache.on_fetch_failure(err, query.limit).await {
                Ok(fallback) => {
                    self.commit_page(
                        ticket,
                        &fallback.page,
                        DataSource::Cache,
                        fallback.synced_at,
                    );
                    Ok(FetchOutcome {
                        page: fallback.page,
                        source: DataSource::Cache,
                        cached_at: fallback.synced_at,
                    })
                }
                Err(terminal) => {
                    self.commit(ticket, |state| {
                        state.loading = false;
                        state.error = Some(terminal.to_string());
                    });
                    Err(terminal.into())
                }
            },
        }
    }

    /// Creates a task and prepends it to the held list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Validation`] before any network call when
    /// `task` is invalid, or [`TaskStoreError::Remote`] when the service
    /// refuses it.
    pub async fn create(&self, task: NewTask) -> TaskStoreResult<Mutation<Task>> {
        task.validate()?;
        let _writer = self.writer.lock().await;
        let ticket = self.begin(true);

        match self.api.create(&task).await {
            Ok(created) => {
                self.commit(ticket, |state| {
                    state.tasks.insert(0, created.clone());
                    state.pagination.total = state.pagination.total.saturating_add(1);
                    settle(state, OperationKind::Create, MutationOutcome::Succeeded);
                });
                Ok(Mutation::Applied(created))
            }
            Err(err) => {
                let operation = PendingOperation::Create {
                    task,
                    enqueued_at: self.clock.utc(),
                };
                self.settle_failure(ticket, err, operation).await
            }
        }
    }

    /// Applies `patch` to a task and replaces it in the held list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Validation`] for an empty or invalid patch,
    /// or [`TaskStoreError::Remote`] when the service refuses it.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> TaskStoreResult<Mutation<Task>> {
        patch.validate()?;
        let _writer = self.writer.lock().await;
        self.apply_update(id, patch, true).await
    }

    /// Sets the completion flag of a task. Unlike [`Self::update`] this does
    /// not raise the loading flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Remote`] when the service refuses it.
    pub async fn toggle_complete(
        &self,
        id: &TaskId,
        completed: bool,
    ) -> TaskStoreResult<Mutation<Task>> {
        let _writer = self.writer.lock().await;
        self.apply_update(id, TaskPatch::completion(completed), false)
            .await
    }

    /// Deletes a task and removes it from the held list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Remote`] when the service refuses it.
    pub async fn delete(&self, id: &TaskId) -> TaskStoreResult<Mutation<()>> {
        let _writer = self.writer.lock().await;
        let ticket = self.begin(true);

        match self.api.delete(id).await {
            Ok(()) => {
                self.commit(ticket, |state| {
                    if let Some(position) = state.tasks.iter().position(|task| task.id() == id) {
                        state.tasks.remove(position);
                    }
                    state.pagination.total = state.pagination.total.saturating_sub(1);
                    settle(state, OperationKind::Delete, MutationOutcome::Succeeded);
                });
                Ok(Mutation::Applied(()))
            }
            Err(err) => {
                let operation = PendingOperation::Delete {
                    id: id.clone(),
                    enqueued_at: self.clock.utc(),
                };
                self.settle_failure(ticket, err, operation).await
            }
        }
    }

    /// Sets the active filter and returns to the first page.
    pub fn set_filters(&self, filter: TaskFilter) {
        self.follow_session();
        self.state.send_modify(|state| {
            state.filter = filter;
            state.pagination.skip = 0;
        });
    }

    /// Clears the active filter and returns to the first page.
    pub fn clear_filters(&self) {
        self.set_filters(TaskFilter::new());
    }

    /// Moves the cursor to the zero-based `page`.
    pub fn set_page(&self, page: u32) {
        self.follow_session();
        self.state.send_modify(|state| {
            state.pagination.skip = page.saturating_mul(state.pagination.limit);
        });
    }

    /// Clears the last error.
    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }

    /// Computes completion statistics over the held tasks.
    #[must_use]
    pub fn analytics(&self) -> TaskAnalytics {
        self.follow_session();
        TaskAnalytics::from_tasks(&self.state.borrow().tasks)
    }

    /// Returns the queued operations, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Storage`] when the queue cannot be read.
    pub async fn pending_operations(&self) -> TaskStoreResult<Vec<PendingOperation>> {
        Ok(self.queue.drain().await?)
    }

    /// Replays the offline queue. The held tasks are not refreshed; fetch
    /// afterwards to reconcile.
    ///
    /// A 401 during replay invalidates the session.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Storage`] when the queue cannot be read or
    /// rewritten.
    pub async fn replay_pending(&self) -> TaskStoreResult<ReplayReport> {
        let _writer = self.writer.lock().await;
        let report = self.queue.replay(self.api.as_ref()).await?;
        if let Some(err) = report.halted_by.as_ref().filter(|err| err.is_unauthorized()) {
            self.invalidate_session(&err.to_string()).await;
        }
        Ok(report)
    }

    /// Ends the session: clears every persisted key and resets the
    /// projection.
    ///
    /// Does not wait for an operation in flight; whatever it returns is
    /// neither persisted nor shown.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Storage`] when the keys cannot be removed.
    /// The projection is reset regardless.
    pub async fn end_session(&self) -> TaskStoreResult<()> {
        let cleared = self.local.clear_all().await;
        self.follow_session();
        cleared.map_err(TaskStoreError::from)
    }

    /// Resets the projection when the local state was cleared since the last
    /// call, and returns the current ticket.
    fn follow_session(&self) -> SessionTicket {
        let current = self.local.ticket();
        let changed = self.session.send_if_modified(|seen| {
            if *seen == current {
                return false;
            }
            *seen = current;
            true
        });
        if changed {
            tracing::debug!("session changed; resetting task projection");
            self.state.send_replace(TaskStoreState::initial(self.page_size));
        }
        current
    }

    /// Applies `change` when `ticket` still belongs to the current session.
    fn commit(&self, ticket: SessionTicket, change: impl FnOnce(&mut TaskStoreState)) {
        if self.local.is_current(ticket) {
            self.state.send_modify(change);
        } else {
            self.follow_session();
        }
    }

    fn resolve(&self, request: FetchRequest) -> TaskQuery {
        let current = self.state.borrow();
        let limit = request.limit.unwrap_or_else(|| {
            PageSize::new(current.pagination.limit).unwrap_or(self.page_size)
        });
        TaskQuery::new()
            .with_filter(request.filter.unwrap_or(current.filter))
            .with_skip(request.skip.unwrap_or(current.pagination.skip))
            .with_limit(limit)
    }

    fn commit_page(
        &self,
        ticket: SessionTicket,
        page: &TaskPage,
        source: DataSource,
        cached_at: Option<DateTime<Utc>>,
    ) {
        self.commit(ticket, |state| {
            state.tasks.clone_from(&page.todos);
            state.pagination = Pagination::from_page(page);
            state.loading = false;
            state.source = source;
            state.cached_at = cached_at;
        });
    }

    fn begin(&self, track_loading: bool) -> SessionTicket {
        let ticket = self.follow_session();
        self.state.send_modify(|state| {
            state.loading = state.loading || track_loading;
            state.error = None;
        });
        ticket
    }

    async fn apply_update(
        &self,
        id: &TaskId,
        patch: TaskPatch,
        track_loading: bool,
    ) -> TaskStoreResult<Mutation<Task>> {
        let ticket = self.begin(track_loading);

        match self.api.update(id, &patch).await {
            Ok(updated) => {
                self.commit(ticket, |state| {
                    if let Some(slot) = state.tasks.iter_mut().find(|task| task.id() == id) {
                        slot.clone_from(&updated);
                    }
                    settle(state, OperationKind::Update, MutationOutcome::Succeeded);
                });
                Ok(Mutation::Applied(updated))
            }
            Err(err) => {
                let operation = PendingOperation::Update {
                    id: id.clone(),
                    patch,
                    enqueued_at: self.clock.utc(),
                };
                self.settle_failure(ticket, err, operation).await
            }
        }
    }

    /// Queues `operation` after a connectivity failure, or records the
    /// failure otherwise.
    async fn settle_failure<T>(
        &self,
        ticket: SessionTicket,
        err: TransportError,
        operation: PendingOperation,
    ) -> TaskStoreResult<Mutation<T>> {
        let kind = operation.kind();
        if err.is_connectivity() {
            self.queue.enqueue_for(ticket, operation).await;
            self.commit(ticket, |state| {
                settle(state, kind, MutationOutcome::OfflineQueued);
            });
            return Ok(Mutation::Queued);
        }
        if err.is_unauthorized() {
            return Err(self.fail_unauthorized(err).await);
        }
        self.commit(ticket, |state| {
            settle(state, kind, MutationOutcome::Failed);
            state.error = Some(err.to_string());
        });
        Err(err.into())
    }

    async fn fail_unauthorized(&self, err: TransportError) -> TaskStoreError {
        self.invalidate_session(&err.to_string()).await;
        err.into()
    }

    /// Clears every persisted key and resets the projection.
    async fn invalidate_session(&self, message: &str) {
        tracing::warn!("remote service rejected the session; clearing local state");
        if let Err(err) = self.local.clear_all().await {
            tracing::error!(error = %err, "could not clear local state after session rejection");
        }
        self.follow_session();
        self.state.send_modify(|state| state.error = Some(message.to_owned()));
    }
}

fn settle(state: &mut TaskStoreState, kind: OperationKind, outcome: MutationOutcome) {
    state.loading = false;
    state.last_mutation = Some(MutationRecord { kind, outcome });
}
