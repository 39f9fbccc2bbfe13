//! Dashboard statistics over the task collection.

use super::Task;
use serde::Serialize;

/// Completion statistics for a set of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskAnalytics {
    /// Number of tasks.
    pub total: usize,
    /// Number of completed tasks.
    pub completed: usize,
    /// Number of open tasks.
    pub pending: usize,
    /// Completed share in whole percent, rounded half up; `0` when empty.
    pub completion_percent: u8,
}

impl TaskAnalytics {
    /// Computes statistics over `tasks`.
    #[must_use]
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|task| task.completed()).count();
        Self {
            total,
            completed,
            pending: total.saturating_sub(completed),
            completion_percent: rounded_percent(completed, total),
        }
    }
}

fn rounded_percent(part: usize, whole: usize) -> u8 {
    let part_wide = u64::try_from(part).unwrap_or(u64::MAX);
    let whole_wide = u64::try_from(whole).unwrap_or(u64::MAX);
    // floor((200 * part + whole) / (2 * whole)) == round_half_up(100 * part / whole)
    let numerator = part_wide.saturating_mul(200).saturating_add(whole_wide);
    let percent = numerator
        .checked_div(whole_wide.saturating_mul(2))
        .unwrap_or(0);
    u8::try_from(percent).unwrap_or(100)
}
