//! Core domain logic for TaskTracker.
//! This crate is the single source of truth for task list invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod reminder;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::form::{FormMode, TaskForm};
pub use model::task::{Task, TaskId, TaskIdError};
pub use reminder::{
    DispatchSummary, InMemoryReminderCenter, PendingReminder, ReminderCenter, ReminderDispatcher,
    ReminderEffect, ReminderError,
};
pub use repo::codec::{decode_tasks, encode_tasks, CodecError};
pub use repo::task_storage::{MemoryTaskStorage, SqliteTaskStorage, StorageError, TaskStorage};
pub use service::ordering::{compare_due_dates, is_overdue_at, ordered_view};
pub use service::task_store::{
    load_tasks, DueDateChange, Mutation, StoreError, StoreResult, TaskPatch, TaskStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
