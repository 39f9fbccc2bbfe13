//! Error types for task domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or validating task values.
///
/// These are raised before any network call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The task title is empty after trimming.
    #[error("title is required")]
    EmptyTitle,

    /// The task title exceeds the character limit.
    #[error("title must be less than {max} characters, got {actual}")]
    TitleTooLong {
        /// Character count of the rejected title.
        actual: usize,
        /// Maximum accepted character count.
        max: usize,
    },

    /// The task description exceeds the character limit.
    #[error("description must be less than {max} characters, got {actual}")]
    DescriptionTooLong {
        /// Character count of the rejected description.
        actual: usize,
        /// Maximum accepted character count.
        max: usize,
    },

    /// An update carries no field to change.
    #[error("update must change at least one field")]
    EmptyPatch,

    /// The requested page size is outside `1..=100`.
    #[error("page size {0} is outside the accepted range 1..=100")]
    InvalidPageSize(u32),
}

/// Error returned while parsing a task category.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task category: {0}")]
pub struct ParseCategoryError(pub String);

/// Error returned while parsing a task priority.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);
