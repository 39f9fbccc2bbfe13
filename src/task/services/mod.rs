//! Application services for the task collection.

mod cache;
mod store;
mod sync_queue;

pub use cache::{CacheFallback, CacheReconciler, CachedSnapshot, Staleness};
pub use store::{
    DataSource, FetchOutcome, FetchRequest, Mutation, MutationOutcome, MutationRecord,
    OFFLINE_QUEUED_MESSAGE, TaskStore, TaskStoreError, TaskStoreResult, TaskStoreState,
};
pub use sync_queue::{ReplayReport, SyncQueue};
