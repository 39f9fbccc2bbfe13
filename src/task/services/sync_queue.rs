//! Durable FIFO of mutations captured while offline.

use tokio::sync::Mutex;

use crate::remote::{TransportError, TransportResult};
use crate::storage::ports::{KeyValueStore, StorageResult};
use crate::storage::{LocalState, SessionTicket, StorageKey};
use crate::task::domain::PendingOperation;
use crate::task::ports::TaskApi;

/// Persisted queue of [`PendingOperation`]s.
///
/// The store is the only copy of the queue: every write serializes the full
/// queue under the instance's write lock, so a reader never observes an
/// entry that is not durable. Writes made on behalf of a session that has
/// since been cleared are discarded.
pub struct SyncQueue<S>
where
    S: KeyValueStore,
{
    local: LocalState<S>,
    write_lock: Mutex<()>,
}

/// Summary of one replay pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Entries accepted by the remote service, including those whose
    /// success response could not be decoded.
    pub applied: usize,
    /// Entries whose target no longer exists.
    pub dropped: usize,
    /// Entries permanently refused by the remote service.
    pub rejected: usize,
    /// Entries left in the queue for a later pass.
    pub retained: usize,
    /// Failure that stopped the pass early, if any.
    pub halted_by: Option<TransportError>,
}

impl ReplayReport {
    /// Returns `true` when the pass stopped on HTTP 401.
    #[must_use]
    pub fn unauthorized(&self) -> bool {
        self.halted_by
            .as_ref()
            .is_some_and(TransportError::is_unauthorized)
    }

    /// Returns `true` when every entry was consumed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.retained == 0
    }
}

enum ReplayStep {
    Applied,
    Unconfirmed(TransportError),
    Dropped,
    Rejected,
    Halt(TransportError),
}

fn classify(result: TransportResult<()>) -> ReplayStep {
    match result {
        Ok(()) => ReplayStep::Applied,
        Err(err) if err.is_decode() => ReplayStep::Unconfirmed(err),
        Err(err) if err.is_not_found() => ReplayStep::Dropped,
        Err(err) if err.is_connectivity() || err.is_server_fault() || err.is_unauthorized() => {
            ReplayStep::Halt(err)
        }
        Err(_) => ReplayStep::Rejected,
    }
}

async fn send<A>(api: &A, operation: &PendingOperation) -> TransportResult<()>
where
    A: TaskApi + ?Sized,
{
    match operation {
        PendingOperation::Create { task, .. } => api.create(task).await.map(drop),
        PendingOperation::Update { id, patch, .. } => api.update(id, patch).await.map(drop),
        PendingOperation::Delete { id, .. } => api.delete(id).await,
    }
}

impl<S> SyncQueue<S>
where
    S: KeyValueStore,
{
    /// Creates a queue persisted through `local`.
    #[must_use]
    pub fn new(local: LocalState<S>) -> Self {
        Self {
            local,
            write_lock: Mutex::new(()),
        }
    }

    /// Appends `operation`. Never fails the caller.
    ///
    /// The queue is rewritten before this returns. When the write fails the
    /// operation is lost and the failure is logged.
    pub async fn enqueue(&self, operation: PendingOperation) {
        self.enqueue_for(self.local.ticket(), operation).await;
    }

    /// Appends `operation` unless the session of `ticket` has ended.
    pub(crate) async fn enqueue_for(&self, ticket: SessionTicket, operation: PendingOperation) {
        let _guard = self.write_lock.lock().await;
        let kind = operation.kind();
        let mut queue = match self.read().await {
            Ok(queue) => queue,
            Err(err) => {
                tracing::error!(%kind, error = %err, "could not read offline queue; operation lost");
                return;
            }
        };
        queue.push(operation);
        match self
            .local
            .save_for(ticket, StorageKey::OfflineQueue, &queue)
            .await
        {
            Ok(true) => tracing::info!(%kind, depth = queue.len(), "queued operation for replay"),
            Ok(false) => tracing::info!(%kind, "session ended; operation not queued"),
            Err(err) => {
                tracing::error!(%kind, error = %err, "could not persist offline queue; operation lost");
            }
        }
    }

    /// Returns the full queue, oldest first, without consuming it.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn drain(&self) -> StorageResult<Vec<PendingOperation>> {
        self.read().await
    }

    /// Overwrites the queue with `operations`.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn replace_all(&self, operations: Vec<PendingOperation>) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write(self.local.ticket(), &operations).await.map(drop)
    }

    /// Empties the queue.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn clear(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.local.remove(StorageKey::OfflineQueue).await
    }

    /// Returns the number of queued operations.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn len(&self) -> StorageResult<usize> {
        Ok(self.read().await?.len())
    }

    /// Returns `true` when nothing is queued.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store.
    pub async fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.read().await?.is_empty())
    }

    /// Replays queued operations in order against `api`.
    ///
    /// A missing target drops the entry; any other 4xx except 401 rejects
    /// it. Connectivity failures, 5xx and 401 stop the pass and keep the
    /// failing entry and everything after it. Queue writes wait until the
    /// pass has finished. When the session is cleared mid-pass, the pass
    /// stops and nothing is written back.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the store; the queue is then left as it
    /// was before the pass.
    pub async fn replay<A>(&self, api: &A) -> StorageResult<ReplayReport>
    where
        A: TaskApi + ?Sized,
    {
        let _guard = self.write_lock.lock().await;
        let ticket = self.local.ticket();
        let queue = self.read().await?;
        let mut report = ReplayReport::default();
        let mut remaining = queue.into_iter();

        while let Some(operation) = remaining.next() {
            if !self.local.is_current(ticket) {
                tracing::info!("session ended during replay; discarding queue");
                return Ok(report);
            }
            let kind = operation.kind();
            match classify(send(api, &operation).await) {
                ReplayStep::Applied => {
                    report.applied = report.applied.saturating_add(1);
                    tracing::debug!(%kind, "replayed queued operation");
                }
                ReplayStep::Unconfirmed(err) => {
                    report.applied = report.applied.saturating_add(1);
                    tracing::warn!(%kind, error = %err, "replayed operation accepted but response unreadable");
                }
                ReplayStep::Dropped => {
                    report.dropped = report.dropped.saturating_add(1);
                    tracing::warn!(%kind, target = ?operation.target_id(), "dropped queued operation: target not found");
                }
                ReplayStep::Rejected => {
                    report.rejected = report.rejected.saturating_add(1);
                    tracing::warn!(%kind, "dropped queued operation: rejected by server");
                }
                ReplayStep::Halt(err) => {
                    tracing::info!(%kind, error = %err, "replay halted");
                    report.halted_by = Some(err);
                    let retained: Vec<PendingOperation> =
                        std::iter::once(operation).chain(remaining.by_ref()).collect();
                    if self.write(ticket, &retained).await? {
                        report.retained = retained.len();
                    } else {
                        tracing::info!("session ended during replay; discarding queue");
                    }
                    return Ok(report);
                }
            }
        }

        self.write(ticket, &[]).await?;
        tracing::info!(
            applied = report.applied,
            dropped = report.dropped,
            rejected = report.rejected,
            "replay finished"
        );
        Ok(report)
    }

    async fn read(&self) -> StorageResult<Vec<PendingOperation>> {
        Ok(self
            .local
            .load::<Vec<PendingOperation>>(StorageKey::OfflineQueue)
            .await?
            .unwrap_or_default())
    }

    /// Returns `false` when the session of `ticket` has ended.
    async fn write(
        &self,
        ticket: SessionTicket,
        operations: &[PendingOperation],
    ) -> StorageResult<bool> {
        if operations.is_empty() {
            return self.local.remove_for(ticket, StorageKey::OfflineQueue).await;
        }
        self.local
            .save_for(ticket, StorageKey::OfflineQueue, operations)
            .await
    }
}
