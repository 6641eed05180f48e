//! Display ordering and overdue evaluation.
//!
//! # Invariants
//! - Total order: dated tasks ascending by due date, then undated tasks.
//! - Equal keys compare `Equal`; callers sort stably so insertion order
//!   breaks ties.

use crate::model::task::Task;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Comparator shared by every due-date-aware projection.
pub fn compare_due_dates(a: &Task, b: &Task) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns `tasks` in display order without mutating the input.
pub fn ordered_view(tasks: &[Task]) -> Vec<&Task> {
    let mut view = tasks.iter().collect::<Vec<_>>();
    // `sort_by` is stable.
    view.sort_by(|a, b| compare_due_dates(a, b));
    view
}

/// Whether `task` was due strictly before `now`.
pub fn is_overdue_at(task: &Task, now: DateTime<Utc>) -> bool {
    task.due_date.is_some_and(|due| due < now)
}
