//! Domain model for the task collection.
//!
//! Tasks are owned by the remote service: the client never mints task
//! identifiers and only ever holds server-issued records. Mutations are
//! expressed as [`NewTask`] and [`TaskPatch`] payloads, and mutations that
//! could not reach the server are captured as [`PendingOperation`] values.

mod analytics;
mod error;
mod fields;
mod filter;
mod ids;
mod pending;
mod task;
pub(crate) mod timestamp;

pub use analytics::TaskAnalytics;
pub use error::{ParseCategoryError, ParsePriorityError, TaskDomainError};
pub use fields::{DESCRIPTION_MAX_CHARS, NewTask, TITLE_MAX_CHARS, TaskPatch};
pub use filter::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageSize, Pagination, TaskFilter, TaskPage, TaskQuery,
};
pub use ids::{TaskId, UserId};
pub use pending::{OperationKind, PendingOperation};
pub use task::{Category, Priority, Task, TaskData};
