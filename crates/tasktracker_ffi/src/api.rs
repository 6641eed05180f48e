//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose task store operations to Dart via FRB.
//! - Hand reminder requests back to Dart, which owns the platform
//!   notification API.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Timestamps cross the boundary as epoch milliseconds (UTC).
//! - Every call reloads the store from the database, so Dart holds no
//!   store state between calls.

use chrono::{DateTime, Utc};
use log::warn;
use mockable::DefaultClock;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use tasktracker_core::db::open_db;
use tasktracker_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DueDateChange, FormMode, Mutation, ReminderEffect, SqliteTaskStorage, Task, TaskForm, TaskId,
    TaskPatch, TaskStore,
};

const TASK_DB_FILE_NAME: &str = "tasktracker.sqlite3";
const TASK_DB_PATH_ENV: &str = "TASKTRACKER_DB_PATH";
static TASK_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
// Each call is load-modify-save over one blob; overlapping calls would drop writes.
static TASK_STORE_LOCK: Mutex<()> = Mutex::new(());

type FfiStore = TaskStore<SqliteTaskStorage, DefaultClock>;

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Task row in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    pub due_epoch_ms: Option<i64>,
    /// Evaluated at response time.
    pub is_overdue: bool,
}

/// Reminder request for the Dart notification layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderRequest {
    /// `schedule` or `cancel`.
    pub kind: String,
    pub task_id: String,
    /// Present for `schedule` only.
    pub title: Option<String>,
    /// Present for `schedule` only.
    pub fire_at_epoch_ms: Option<i64>,
}

/// Response envelope for `task_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListResponse {
    pub items: Vec<TaskItem>,
    pub message: String,
}

/// Response envelope for task mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    pub ok: bool,
    /// Id of the created, updated or removed task, when there is one.
    pub task_id: Option<String>,
    pub message: String,
    /// Reminder work Dart must perform, in order.
    pub reminders: Vec<ReminderRequest>,
}

impl TaskActionResponse {
    fn success(
        message: impl Into<String>,
        task_id: Option<TaskId>,
        effects: &[ReminderEffect],
    ) -> Self {
        Self {
            ok: true,
            task_id: task_id.map(|id| id.to_string()),
            message: message.into(),
            reminders: effects.iter().map(to_reminder_request).collect(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            message: message.into(),
            reminders: Vec::new(),
        }
    }
}

/// Lists tasks in display order (dated ascending, then undated).
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> TaskListResponse {
    let listed = with_task_store(|store| {
        let store: &FfiStore = store;
        Ok(store
            .ordered_view()
            .into_iter()
            .map(|task| to_task_item(store, task))
            .collect::<Vec<_>>())
    });
    match listed {
        Ok(items) => {
            let message = if items.is_empty() {
                "No tasks.".to_string()
            } else {
                format!("{} task(s).", items.len())
            };
            TaskListResponse { items, message }
        }
        Err(err) => TaskListResponse {
            items: Vec::new(),
            message: format!("task_list failed: {err}"),
        },
    }
}

/// Creates a task with an optional due date.
#[flutter_rust_bridge::frb(sync)]
pub fn task_add(title: String, due_epoch_ms: Option<i64>) -> TaskActionResponse {
    run_action("task_add", |store| {
        let due_date = due_epoch_ms.map(parse_epoch_ms).transpose()?;
        let created = store.add(&title, due_date).map_err(|err| err.to_string())?;
        Ok(task_response("Task created.", created))
    })
}

/// Flips completion; unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle(task_id: String) -> TaskActionResponse {
    run_action("task_toggle", |store| {
        let id = parse_task_id(&task_id)?;
        let toggled = store.toggle_completion(id);
        let message = match toggled.value {
            Some(true) => "Task completed.",
            Some(false) => "Task reopened.",
            None => "Task not found; nothing changed.",
        };
        Ok(TaskActionResponse::success(
            message,
            toggled.value.map(|_| id),
            &toggled.effects,
        ))
    })
}

/// Updates title and/or due date of an existing task.
///
/// `clear_due_date=true` removes the due date and wins over `due_epoch_ms`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(
    task_id: String,
    title: Option<String>,
    due_epoch_ms: Option<i64>,
    clear_due_date: bool,
) -> TaskActionResponse {
    run_action("task_update", |store| {
        let id = parse_task_id(&task_id)?;
        let due_date = if clear_due_date {
            DueDateChange::Clear
        } else {
            match due_epoch_ms {
                Some(value) => DueDateChange::Set(parse_epoch_ms(value)?),
                None => DueDateChange::Keep,
            }
        };
        let patch = TaskPatch { title, due_date };
        let updated = store.update(id, patch).map_err(|err| err.to_string())?;
        Ok(task_response("Task updated.", updated))
    })
}

/// Deletes one task; unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(task_id: String) -> TaskActionResponse {
    run_action("task_delete", |store| {
        let id = parse_task_id(&task_id)?;
        let deleted = store.delete(id);
        let message = if deleted.value.is_some() {
            "Task deleted."
        } else {
            "Task not found; nothing changed."
        };
        Ok(TaskActionResponse::success(
            message,
            deleted.value.map(|task| task.id),
            &deleted.effects,
        ))
    })
}

/// Deletes tasks by their row positions in `task_list` order.
#[flutter_rust_bridge::frb(sync)]
pub fn task_delete_rows(rows: Vec<u32>) -> TaskActionResponse {
    run_action("task_delete_rows", |store| {
        let offsets = rows
            .into_iter()
            .filter_map(|row| usize::try_from(row).ok())
            .collect::<Vec<_>>();
        let deleted = store.delete_at_offsets(&offsets);
        Ok(TaskActionResponse::success(
            format!("Deleted {} task(s).", deleted.value.len()),
            None,
            &deleted.effects,
        ))
    })
}

/// Removes every task.
#[flutter_rust_bridge::frb(sync)]
pub fn task_clear_all() -> TaskActionResponse {
    run_action("task_clear_all", |store| {
        let cleared = store.clear_all();
        Ok(TaskActionResponse::success(
            format!("Cleared {} task(s).", cleared.value),
            None,
            &cleared.effects,
        ))
    })
}

/// Submits the entry form: creates when `editing_task_id` is `None`,
/// otherwise edits that task (a missing due date clears it).
#[flutter_rust_bridge::frb(sync)]
pub fn task_submit_form(
    editing_task_id: Option<String>,
    title: String,
    due_epoch_ms: Option<i64>,
) -> TaskActionResponse {
    run_action("task_submit_form", |store| {
        let mode = match editing_task_id.as_deref() {
            Some(raw) => FormMode::Editing(parse_task_id(raw)?),
            None => FormMode::Creating,
        };
        let form = TaskForm {
            mode,
            title,
            due_date: due_epoch_ms.map(parse_epoch_ms).transpose()?,
        };
        let submitted = store.submit_form(&form).map_err(|err| err.to_string())?;
        let message = if form.is_editing() {
            "Task updated."
        } else {
            "Task created."
        };
        Ok(task_response(message, submitted))
    })
}

fn task_response(message: &str, mutation: Mutation<Task>) -> TaskActionResponse {
    TaskActionResponse::success(message, Some(mutation.value.id), &mutation.effects)
}

fn run_action(
    operation: &str,
    f: impl FnOnce(&mut FfiStore) -> Result<TaskActionResponse, String>,
) -> TaskActionResponse {
    match with_task_store(f) {
        Ok(response) => response,
        Err(err) => {
            warn!("event=ffi_call module=ffi status=error operation={operation}");
            TaskActionResponse::failure(format!("{operation} failed: {err}"))
        }
    }
}

fn resolve_task_db_path() -> PathBuf {
    TASK_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(TASK_DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(TASK_DB_FILE_NAME)
        })
        .clone()
}

fn with_task_store<T>(f: impl FnOnce(&mut FfiStore) -> Result<T, String>) -> Result<T, String> {
    let _guard = TASK_STORE_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let conn = open_db(resolve_task_db_path())
        .map_err(|err| format!("task DB open failed: {err}"))?;
    let mut store = TaskStore::open(SqliteTaskStorage::new(conn), DefaultClock);
    f(&mut store)
}

fn parse_task_id(raw: &str) -> Result<TaskId, String> {
    raw.parse::<TaskId>().map_err(|err| err.to_string())
}

fn parse_epoch_ms(value: i64) -> Result<DateTime<Utc>, String> {
    DateTime::<Utc>::from_timestamp_millis(value)
        .ok_or_else(|| format!("due date `{value}` is out of range"))
}

fn to_task_item(store: &FfiStore, task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.to_string(),
        title: task.title.clone(),
        is_completed: task.is_completed,
        due_epoch_ms: task.due_date.map(|due| due.timestamp_millis()),
        is_overdue: store.is_overdue(task),
    }
}

fn to_reminder_request(effect: &ReminderEffect) -> ReminderRequest {
    match effect {
        ReminderEffect::Schedule { id, title, fire_at } => ReminderRequest {
            kind: "schedule".to_string(),
            task_id: id.to_string(),
            title: Some(title.clone()),
            fire_at_epoch_ms: Some(fire_at.timestamp_millis()),
        },
        ReminderEffect::Cancel { id } => ReminderRequest {
            kind: "cancel".to_string(),
            task_id: id.to_string(),
            title: None,
            fire_at_epoch_ms: None,
        },
    }
}
