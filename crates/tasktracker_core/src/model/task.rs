//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical to-do record owned by the task store.
//! - Provide a stable identifier type shared by storage, reminders and FFI.
//!
//! # Invariants
//! - `TaskId` is never nil and never reused for another task.
//! - Title emptiness is enforced by store operations, not by `Task` itself.
//! - `due_date` is always stored in UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for one task.
///
/// Serialized as a hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID, rejecting the nil value.
    pub fn from_uuid(value: Uuid) -> Result<Self, TaskIdError> {
        if value.is_nil() {
            return Err(TaskIdError::Nil);
        }
        Ok(Self(value))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let uuid = Uuid::parse_str(trimmed)
            .map_err(|_| TaskIdError::Malformed(trimmed.to_string()))?;
        Self::from_uuid(uuid)
    }
}

impl TryFrom<Uuid> for TaskId {
    type Error = TaskIdError;

    fn try_from(value: Uuid) -> Result<Self, Self::Error> {
        Self::from_uuid(value)
    }
}

impl From<TaskId> for Uuid {
    fn from(value: TaskId) -> Self {
        value.0
    }
}

/// Errors raised when external text or UUIDs cannot become a `TaskId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskIdError {
    Nil,
    Malformed(String),
}

impl Display for TaskIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nil => write!(f, "task id must not be nil"),
            Self::Malformed(value) => write!(f, "malformed task id `{value}`"),
        }
    }
}

impl Error for TaskIdError {}

/// One to-do entry.
///
/// Wire names follow the persisted JSON format (`isCompleted`, `dueDate`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Sole key for lookup, update and delete.
    pub id: TaskId,
    /// Display title; stored trimmed.
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    /// Absent means "no deadline".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates an open task with a generated id.
    pub fn new(title: impl Into<String>, due_date: Option<DateTime<Utc>>) -> Self {
        Self::with_id(TaskId::new(), title, due_date)
    }

    /// Creates an open task with a caller-provided id.
    ///
    /// Used by import paths where identity already exists.
    pub fn with_id(id: TaskId, title: impl Into<String>, due_date: Option<DateTime<Utc>>) -> Self {
        Self {
            id,
            title: title.into(),
            is_completed: false,
            due_date,
        }
    }

    /// Flips the completion flag.
    pub fn toggle(&mut self) {
        self.is_completed = !self.is_completed;
    }

    pub fn has_due_date(&self) -> bool {
        self.due_date.is_some()
    }
}
