//! Shared fixtures for unit tests.

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex};

use crate::task::domain::{Task, TaskData, TaskId, UserId};

/// Clock frozen at a settable instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn advance(&self, delta: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock should not be poisoned");
        *now += delta;
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock should not be poisoned")
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("fixed instant should be unambiguous")
}

pub fn owner() -> UserId {
    UserId::new("user-1").expect("owner id should be valid")
}

/// Builds an open task created `minutes_ago` minutes before [`epoch`].
pub fn task(id: &str, title: &str, minutes_ago: i64) -> Task {
    let created_at = epoch() - TimeDelta::minutes(minutes_ago);
    Task::from_data(TaskData {
        id: TaskId::new(id).expect("task id should be valid"),
        title: title.to_owned(),
        description: None,
        completed: false,
        category: crate::task::domain::Category::Other,
        priority: crate::task::domain::Priority::Medium,
        due_date: None,
        created_at,
        updated_at: created_at,
        user_id: owner(),
    })
}
