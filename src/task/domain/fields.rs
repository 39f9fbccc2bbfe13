//! Mutation payloads for creating and updating tasks.

use super::{Category, Priority, TaskDomainError, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of characters accepted in a task title.
pub const TITLE_MAX_CHARS: usize = 200;

/// Maximum number of characters accepted in a task description.
pub const DESCRIPTION_MAX_CHARS: usize = 1000;

/// Fields of a task to be created. The server assigns identifier, owner,
/// completion flag and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    category: Category,
    priority: Priority,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    /// Creates a payload with the given title, the default category
    /// (`other`) and the default priority (`medium`).
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            category: Category::default(),
            priority: Priority::default(),
            due_date: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the category.
    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the due timestamp.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the due timestamp, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Checks the payload against the local schema.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`], [`TaskDomainError::TitleTooLong`]
    /// or [`TaskDomainError::DescriptionTooLong`].
    pub fn validate(&self) -> Result<(), TaskDomainError> {
        validate_title(&self.title)?;
        validate_description(self.description.as_deref())
    }
}

/// Partial update of a task. Unset fields are left unchanged by the server
/// and omitted from the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    due_date: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a patch that only changes the completion flag.
    #[must_use]
    pub fn completion(completed: bool) -> Self {
        Self::new().with_completed(completed)
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Sets the category.
    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the due timestamp.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Returns the new title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the new description, if set.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the new completion flag, if set.
    #[must_use]
    pub const fn completed(&self) -> Option<bool> {
        self.completed
    }

    /// Returns the new category, if set.
    #[must_use]
    pub const fn category(&self) -> Option<Category> {
        self.category
    }

    /// Returns the new priority, if set.
    #[must_use]
    pub const fn priority(&self) -> Option<Priority> {
        self.priority
    }

    /// Returns the new due timestamp, if set.
    #[must_use]
    pub const fn due_date(&self) -> Option<DateTime<Utc>> {
        self.due_date
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.category.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Checks the patch against the local schema.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyPatch`] when nothing would change, or
    /// the same field errors as [`NewTask::validate`].
    pub fn validate(&self) -> Result<(), TaskDomainError> {
        if self.is_empty() {
            return Err(TaskDomainError::EmptyPatch);
        }
        if let Some(title) = self.title.as_deref() {
            validate_title(title)?;
        }
        validate_description(self.description.as_deref())
    }
}

fn validate_title(title: &str) -> Result<(), TaskDomainError> {
    if title.trim().is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    let actual = title.chars().count();
    if actual > TITLE_MAX_CHARS {
        return Err(TaskDomainError::TitleTooLong {
            actual,
            max: TITLE_MAX_CHARS,
        });
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), TaskDomainError> {
    let Some(text) = description else {
        return Ok(());
    };
    let actual = text.chars().count();
    if actual > DESCRIPTION_MAX_CHARS {
        return Err(TaskDomainError::DescriptionTooLong {
            actual,
            max: DESCRIPTION_MAX_CHARS,
        });
    }
    Ok(())
}
