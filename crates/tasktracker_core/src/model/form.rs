//! Entry form state for create/edit flows.
//!
//! # Responsibility
//! - Replace loosely synchronized UI flags with one explicit mode value.
//! - Carry the draft fields submitted to the task store.
//!
//! # Invariants
//! - `FormMode::Editing` always names the task the draft was seeded from.
//! - `reset()` returns the form to `Creating` with empty fields.

use super::task::{Task, TaskId};
use chrono::{DateTime, Utc};

/// Whether a submission creates a new task or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Creating,
    Editing(TaskId),
}

/// Draft fields plus the mode they will be submitted under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskForm {
    pub mode: FormMode,
    pub title: String,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskForm {
    /// Empty form in create mode.
    pub fn creating() -> Self {
        Self::default()
    }

    /// Form seeded from an existing task in edit mode.
    pub fn editing(task: &Task) -> Self {
        Self {
            mode: FormMode::Editing(task.id),
            title: task.title.clone(),
            due_date: task.due_date,
        }
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Editing(_))
    }

    /// Clears draft fields and switches back to create mode.
    pub fn reset(&mut self) {
        *self = Self::creating();
    }
}
