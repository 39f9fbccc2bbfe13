//! Listing filters, page requests and page responses.

use super::{Category, Priority, Task, TaskDomainError};
use serde::{Deserialize, Serialize};

/// Page size used when the caller does not request one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size accepted by the remote service.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Optional listing filter. An unset field does not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Only tasks in this category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Only tasks with this priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Only completed (`true`) or open (`false`) tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskFilter {
    /// Creates a filter that matches everything.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            category: None,
            priority: None,
            completed: None,
        }
    }

    /// Restricts the filter to one category.
    #[must_use]
    pub const fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts the filter to one priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Restricts the filter by completion flag.
    #[must_use]
    pub const fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    /// Returns `true` when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category.is_none() && self.priority.is_none() && self.completed.is_none()
    }

    /// Returns `true` when `task` passes every set field.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.category.is_none_or(|category| task.category() == category)
            && self.priority.is_none_or(|priority| task.priority() == priority)
            && self
                .completed
                .is_none_or(|completed| task.completed() == completed)
    }
}

/// Validated page size in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    /// Creates a validated page size.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPageSize`] outside `1..=100`.
    pub const fn new(value: u32) -> Result<Self, TaskDomainError> {
        if value == 0 || value > MAX_PAGE_SIZE {
            return Err(TaskDomainError::InvalidPageSize(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = TaskDomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.0
    }
}

/// A listing request: filter plus offset window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Listing filter.
    pub filter: TaskFilter,
    /// Number of matching tasks to skip.
    pub skip: u32,
    /// Maximum number of tasks to return.
    pub limit: PageSize,
}

impl TaskQuery {
    /// Creates a query for the first page with the default size.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    #[must_use]
    pub const fn with_filter(mut self, filter: TaskFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the offset.
    #[must_use]
    pub const fn with_skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_limit(mut self, limit: PageSize) -> Self {
        self.limit = limit;
        self
    }

    /// Returns the query-string pairs for the listing endpoint, omitting
    /// unset filter fields.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.value().to_string()),
        ];
        if let Some(category) = self.filter.category {
            pairs.push(("category", category.as_str().to_owned()));
        }
        if let Some(priority) = self.filter.priority {
            pairs.push(("priority", priority.as_str().to_owned()));
        }
        if let Some(completed) = self.filter.completed {
            pairs.push(("completed", completed.to_string()));
        }
        pairs
    }
}

/// One page of tasks as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPage {
    /// Tasks in server order.
    pub todos: Vec<Task>,
    /// Total number of matching tasks on the server.
    pub total: u32,
    /// Offset of this page.
    pub skip: u32,
    /// Requested page size.
    pub limit: u32,
}

/// Server-reported pagination cursor.
///
/// Values are advisory: `total` is not re-validated against the number of
/// tasks actually held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Offset of the current page.
    pub skip: u32,
    /// Page size.
    pub limit: u32,
    /// Total number of matching tasks.
    pub total: u32,
}

impl Pagination {
    /// Creates an empty cursor with the given page size.
    #[must_use]
    pub const fn with_limit(limit: PageSize) -> Self {
        Self {
            skip: 0,
            limit: limit.value(),
            total: 0,
        }
    }

    /// Returns the cursor reported alongside `page`.
    #[must_use]
    pub const fn from_page(page: &TaskPage) -> Self {
        Self {
            skip: page.skip,
            limit: page.limit,
            total: page.total,
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::with_limit(PageSize::default())
    }
}
