//! Task record and its classification enums.

use super::{ParseCategoryError, ParsePriorityError, TaskId, UserId, timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Work-related task.
    Work,
    /// Personal errand.
    Personal,
    /// Study or learning task.
    Study,
    /// Shopping list item.
    Shopping,
    /// Anything else.
    #[default]
    Other,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 5] = [
        Self::Work,
        Self::Personal,
        Self::Study,
        Self::Shopping,
        Self::Other,
    ];

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Study => "study",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Category {
    type Error = ParseCategoryError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "work" => Ok(Self::Work),
            "personal" => Ok(Self::Personal),
            "study" => Ok(Self::Study),
            "shopping" => Ok(Self::Shopping),
            "other" => Ok(Self::Other),
            _ => Err(ParseCategoryError(value.to_owned())),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal priority.
    #[default]
    Medium,
    /// Needs attention first.
    High,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParsePriorityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ParsePriorityError(value.to_owned())),
        }
    }
}

/// A task as reported by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    completed: bool,
    category: Category,
    priority: Priority,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    due_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    updated_at: DateTime<Utc>,
    user_id: UserId,
}

/// Parameter object for building a [`Task`] from known field values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskData {
    /// Server-issued identifier.
    pub id: TaskId,
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Completion flag.
    pub completed: bool,
    /// Task category.
    pub category: Category,
    /// Task priority.
    pub priority: Priority,
    /// Optional due timestamp.
    pub due_date: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning user.
    pub user_id: UserId,
}

impl Task {
    /// Builds a task from field values.
    #[must_use]
    pub fn from_data(data: TaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            completed: data.completed,
            category: data.category,
            priority: data.priority,
            due_date: data.due_date,
            created_at: data.created_at,
            updated_at: data.updated_at,
            user_id: data.user_id,
        }
    }

    /// Decomposes the task into its field values.
    #[must_use]
    pub fn into_data(self) -> TaskData {
        TaskData {
            id: self.id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            category: self.category,
            priority: self.priority,
            due_date: self.due_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
            user_id: self.user_id,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
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

    /// Returns `true` when the task is completed.
    #[must_use]
    pub const fn completed(&self) -> bool {
        self.completed
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

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns `true` when the due date fell on a calendar day (UTC) before
    /// the day of `now`.
    ///
    /// A task due earlier today is not overdue yet.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.due_date
            .is_some_and(|due| due.date_naive() < now.date_naive())
    }

    /// Returns `true` when the due date falls on the same calendar day (UTC)
    /// as `now`.
    #[must_use]
    pub fn is_due_today(&self, now: DateTime<Utc>) -> bool {
        self.due_date
            .is_some_and(|due| due.date_naive() == now.date_naive())
    }
}
