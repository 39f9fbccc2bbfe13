//! Mutations captured while the remote service was unreachable.

use super::{NewTask, TaskId, TaskPatch};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind tag of a [`PendingOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Task creation.
    Create,
    /// Partial task update.
    Update,
    /// Task deletion.
    Delete,
}

impl OperationKind {
    /// Returns the canonical tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queued mutation awaiting replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PendingOperation {
    /// Create a task with the given fields.
    Create {
        /// Fields of the task to create.
        task: NewTask,
        /// When the operation was queued.
        enqueued_at: DateTime<Utc>,
    },
    /// Apply a partial update to an existing task.
    Update {
        /// Target task.
        id: TaskId,
        /// Fields to change.
        patch: TaskPatch,
        /// When the operation was queued.
        enqueued_at: DateTime<Utc>,
    },
    /// Delete an existing task.
    Delete {
        /// Target task.
        id: TaskId,
        /// When the operation was queued.
        enqueued_at: DateTime<Utc>,
    },
}

impl PendingOperation {
    /// Returns the kind tag.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Create { .. } => OperationKind::Create,
            Self::Update { .. } => OperationKind::Update,
            Self::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Returns the targeted task, if the operation addresses an existing one.
    #[must_use]
    pub const fn target_id(&self) -> Option<&TaskId> {
        match self {
            Self::Create { .. } => None,
            Self::Update { id, .. } | Self::Delete { id, .. } => Some(id),
        }
    }

    /// Returns when the operation was queued.
    #[must_use]
    pub const fn enqueued_at(&self) -> DateTime<Utc> {
        match self {
            Self::Create { enqueued_at, .. }
            | Self::Update { enqueued_at, .. }
            | Self::Delete { enqueued_at, .. } => *enqueued_at,
        }
    }
}
