//! Task store: canonical task list with write-through persistence.
//!
//! # Responsibility
//! - Own the in-memory task list and every mutation on it.
//! - Flush the full list to storage after each effective mutation.
//! - Report reminder work as effects instead of calling a notification API.
//!
//! # Invariants
//! - Exactly one task per `TaskId`; ids are never reused or rewritten.
//! - `tasks()` is insertion order; display order is derived on demand.
//! - Id-targeting operations other than `update` treat unknown ids as no-ops.
//! - Storage failures are logged and never surface to callers.

use crate::model::form::{FormMode, TaskForm};
use crate::model::task::{Task, TaskId};
use crate::reminder::ReminderEffect;
use crate::repo::codec::{decode_tasks, encode_tasks};
use crate::repo::task_storage::TaskStorage;
use crate::service::ordering;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use mockable::Clock;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Reportable store failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Caller input was rejected (for example an empty title).
    InvalidInput(String),
    /// `update` targeted an id that is not in the store.
    NotFound(TaskId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for StoreError {}

/// Mutation result plus the reminder requests it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation<T> {
    pub value: T,
    pub effects: Vec<ReminderEffect>,
}

impl<T> Mutation<T> {
    fn new(value: T, effects: Vec<ReminderEffect>) -> Self {
        Self { value, effects }
    }

    fn quiet(value: T) -> Self {
        Self::new(value, Vec::new())
    }
}

/// How `update` treats the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueDateChange {
    #[default]
    Keep,
    Set(DateTime<Utc>),
    Clear,
}

impl From<Option<DateTime<Utc>>> for DueDateChange {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

/// Fields supplied to `update`; unsupplied fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub due_date: DueDateChange,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = DueDateChange::Set(due_date);
        self
    }

    pub fn clear_due_date(mut self) -> Self {
        self.due_date = DueDateChange::Clear;
        self
    }
}

/// Reads the persisted task list, degrading to empty on any failure.
///
/// Duplicate ids in persisted data keep their first occurrence.
pub fn load_tasks(storage: &impl TaskStorage) -> Vec<Task> {
    let Some(bytes) = storage.load_raw() else {
        info!("event=store_load module=store status=ok source=empty count=0");
        return Vec::new();
    };

    let decoded = match decode_tasks(&bytes) {
        Ok(tasks) => tasks,
        Err(err) => {
            warn!(
                "event=store_load module=store status=degraded error_code=decode_failed error={}",
                err
            );
            return Vec::new();
        }
    };

    let mut seen = HashSet::with_capacity(decoded.len());
    let total = decoded.len();
    let tasks = decoded
        .into_iter()
        .filter(|task| seen.insert(task.id))
        .collect::<Vec<_>>();
    if tasks.len() != total {
        warn!(
            "event=store_load module=store status=degraded error_code=duplicate_ids dropped={}",
            total - tasks.len()
        );
    }

    info!(
        "event=store_load module=store status=ok source=storage count={}",
        tasks.len()
    );
    tasks
}

/// Owner of the canonical task list.
pub struct TaskStore<S: TaskStorage, C: Clock> {
    tasks: Vec<Task>,
    storage: S,
    clock: C,
}

impl<S: TaskStorage, C: Clock> TaskStore<S, C> {
    /// Creates a store initialized from `storage`.
    pub fn open(storage: S, clock: C) -> Self {
        let tasks = load_tasks(&storage);
        Self {
            tasks,
            storage,
            clock,
        }
    }

    /// Tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current time according to the injected clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    /// Creates a task from a trimmed, non-empty title.
    ///
    /// # Errors
    /// - `StoreError::InvalidInput` when `title` is empty or whitespace-only.
    pub fn add(
        &mut self,
        title: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> StoreResult<Mutation<Task>> {
        let title = normalize_title(title)?;
        let task = Task::new(title, due_date);
        self.tasks.push(task.clone());
        self.persist("task_add");

        let effects = ReminderEffect::schedule_for(&task, self.now())
            .into_iter()
            .collect::<Vec<_>>();
        info!(
            "event=task_add module=store status=ok task_id={} has_due_date={} reminders={}",
            task.id,
            task.has_due_date(),
            effects.len()
        );
        Ok(Mutation::new(task, effects))
    }

    /// Flips completion. Returns the new state, or `None` for an unknown id.
    pub fn toggle_completion(&mut self, id: TaskId) -> Mutation<Option<bool>> {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == id) else {
            debug!("event=task_toggle module=store status=noop task_id={id}");
            return Mutation::quiet(None);
        };
        task.toggle();
        let completed = task.is_completed;
        self.persist("task_toggle");

        info!("event=task_toggle module=store status=ok task_id={id} completed={completed}");
        Mutation::quiet(Some(completed))
    }

    /// Overwrites the supplied fields of an existing task.
    ///
    /// A due date change yields `Schedule` for a future date and `Cancel`
    /// otherwise. A title change alone reschedules a still-pending reminder.
    ///
    /// # Errors
    /// - `StoreError::NotFound` when `id` is unknown.
    /// - `StoreError::InvalidInput` when a supplied title is blank.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> StoreResult<Mutation<Task>> {
        let now = self.now();
        let index = self.position(id).ok_or(StoreError::NotFound(id))?;
        let title = patch.title.as_deref().map(normalize_title).transpose()?;

        let task = &mut self.tasks[index];
        let mut title_changed = false;
        if let Some(title) = title {
            title_changed = title != task.title;
            task.title = title;
        }

        let previous_due = task.due_date;
        match patch.due_date {
            DueDateChange::Keep => {}
            DueDateChange::Set(due) => task.due_date = Some(due),
            DueDateChange::Clear => task.due_date = None,
        }
        let due_changed = task.due_date != previous_due;
        let updated = task.clone();
        self.persist("task_update");

        let mut effects = Vec::new();
        if due_changed {
            effects.push(
                ReminderEffect::schedule_for(&updated, now)
                    .unwrap_or_else(|| ReminderEffect::cancel(id)),
            );
        } else if title_changed {
            effects.extend(ReminderEffect::schedule_for(&updated, now));
        }

        info!(
            "event=task_update module=store status=ok task_id={id} title_changed={title_changed} due_changed={due_changed}"
        );
        Ok(Mutation::new(updated, effects))
    }

    /// Removes one task. Returns it, or `None` for an unknown id.
    pub fn delete(&mut self, id: TaskId) -> Mutation<Option<Task>> {
        let Some(index) = self.position(id) else {
            debug!("event=task_delete module=store status=noop task_id={id}");
            return Mutation::quiet(None);
        };
        let removed = self.tasks.remove(index);
        self.persist("task_delete");

        info!("event=task_delete module=store status=ok task_id={id}");
        Mutation::new(Some(removed), vec![ReminderEffect::cancel(id)])
    }

    /// Removes tasks by their row positions in `ordered_view()`.
    ///
    /// Out-of-range and repeated offsets are ignored.
    pub fn delete_at_offsets(&mut self, offsets: &[usize]) -> Mutation<Vec<Task>> {
        let view_ids = self
            .ordered_view()
            .into_iter()
            .map(|task| task.id)
            .collect::<Vec<_>>();
        let targets = offsets
            .iter()
            .filter_map(|offset| view_ids.get(*offset).copied())
            .collect::<HashSet<_>>();
        if targets.is_empty() {
            debug!("event=task_delete_offsets module=store status=noop");
            return Mutation::quiet(Vec::new());
        }

        let (removed, kept): (Vec<Task>, Vec<Task>) = std::mem::take(&mut self.tasks)
            .into_iter()
            .partition(|task| targets.contains(&task.id));
        self.tasks = kept;
        self.persist("task_delete_offsets");

        let effects = removed
            .iter()
            .map(|task| ReminderEffect::cancel(task.id))
            .collect::<Vec<_>>();
        info!(
            "event=task_delete_offsets module=store status=ok removed={}",
            removed.len()
        );
        Mutation::new(removed, effects)
    }

    /// Removes every task. Returns the number removed.
    ///
    /// Cancels reminders for every task that carried a due date.
    pub fn clear_all(&mut self) -> Mutation<usize> {
        let removed = std::mem::take(&mut self.tasks);
        let effects = removed
            .iter()
            .filter(|task| task.has_due_date())
            .map(|task| ReminderEffect::cancel(task.id))
            .collect::<Vec<_>>();
        self.persist("task_clear_all");

        info!(
            "event=task_clear_all module=store status=ok removed={} reminders_cancelled={}",
            removed.len(),
            effects.len()
        );
        Mutation::new(removed.len(), effects)
    }

    /// Submits an entry form as `add` or `update` depending on its mode.
    ///
    /// In edit mode an empty `due_date` clears the task's due date.
    pub fn submit_form(&mut self, form: &TaskForm) -> StoreResult<Mutation<Task>> {
        match form.mode {
            FormMode::Creating => self.add(&form.title, form.due_date),
            FormMode::Editing(id) => self.update(
                id,
                TaskPatch {
                    title: Some(form.title.clone()),
                    due_date: DueDateChange::from(form.due_date),
                },
            ),
        }
    }

    /// Display ordering: dated ascending, then undated, stable.
    pub fn ordered_view(&self) -> Vec<&Task> {
        ordering::ordered_view(&self.tasks)
    }

    /// Whether `task` is past due right now.
    pub fn is_overdue(&self, task: &Task) -> bool {
        ordering::is_overdue_at(task, self.now())
    }

    fn position(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }

    fn persist(&self, operation: &'static str) {
        let bytes = match encode_tasks(&self.tasks) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(
                    "event=store_save module=store status=error operation={operation} error_code=encode_failed error={err}"
                );
                return;
            }
        };
        if let Err(err) = self.storage.save_raw(&bytes) {
            error!(
                "event=store_save module=store status=error operation={operation} error_code=save_failed error={err}"
            );
            return;
        }
        debug!(
            "event=store_save module=store status=ok operation={operation} count={} bytes={}",
            self.tasks.len(),
            bytes.len()
        );
    }
}

fn normalize_title(raw: &str) -> StoreResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput(
            "task title must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
