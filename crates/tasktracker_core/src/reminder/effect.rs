//! Reminder requests returned alongside store mutations.

use crate::model::task::{Task, TaskId};
use chrono::{DateTime, Utc};

/// One pending request for the notification facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderEffect {
    /// One-shot reminder; supersedes any earlier request for the same id.
    Schedule {
        id: TaskId,
        title: String,
        fire_at: DateTime<Utc>,
    },
    /// Withdraws any pending reminder for `id`.
    Cancel { id: TaskId },
}

impl ReminderEffect {
    /// Schedule request for `task`, or `None` unless its due date is after `now`.
    pub fn schedule_for(task: &Task, now: DateTime<Utc>) -> Option<Self> {
        match task.due_date {
            Some(fire_at) if fire_at > now => Some(Self::Schedule {
                id: task.id,
                title: task.title.clone(),
                fire_at,
            }),
            _ => None,
        }
    }

    pub fn cancel(id: TaskId) -> Self {
        Self::Cancel { id }
    }

    pub fn task_id(&self) -> TaskId {
        match self {
            Self::Schedule { id, .. } | Self::Cancel { id } => *id,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel { .. })
    }
}
