//! Remote task service port.

use crate::remote::TransportResult;
use crate::task::domain::{NewTask, Task, TaskId, TaskPage, TaskPatch, TaskQuery};
use async_trait::async_trait;

/// CRUD contract of the remote task service.
///
/// Implementations must report "no response received" as
/// [`crate::remote::TransportError::Connectivity`] and every error response
/// as [`crate::remote::TransportError::Server`].
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// Lists one page of tasks matching `query`, in server order.
    async fn list(&self, query: &TaskQuery) -> TransportResult<TaskPage>;

    /// Fetches a single task.
    async fn get(&self, id: &TaskId) -> TransportResult<Task>;

    /// Creates a task and returns the stored record.
    async fn create(&self, task: &NewTask) -> TransportResult<Task>;

    /// Applies a partial update and returns the stored record.
    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> TransportResult<Task>;

    /// Deletes a task.
    async fn delete(&self, id: &TaskId) -> TransportResult<()>;
}
