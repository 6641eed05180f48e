//! Notification port and effect dispatcher.
//!
//! # Responsibility
//! - Define the contract a platform notification facility must satisfy.
//! - Apply store-produced effects without blocking or retrying.
//!
//! # Invariants
//! - Permission is queried exactly once, when the dispatcher is built.
//! - Without permission, schedule requests are accepted but dropped.
//! - Cancel requests are always forwarded; cancelling nothing is a no-op.
//! - Dispatch failures are logged, never returned to store callers.

use super::effect::ReminderEffect;
use crate::model::task::TaskId;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a notification facility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderError {
    /// The facility refused the request.
    Rejected(String),
    /// The facility is not reachable in this process.
    Unavailable,
}

impl Display for ReminderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "reminder rejected: {reason}"),
            Self::Unavailable => write!(f, "reminder facility unavailable"),
        }
    }
}

impl Error for ReminderError {}

/// Platform notification facility.
pub trait ReminderCenter {
    /// Asks the user for notification permission.
    fn request_permission(&self) -> bool;
    /// Requests a one-shot reminder; a repeated id supersedes the old request.
    fn schedule(
        &self,
        id: TaskId,
        title: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<(), ReminderError>;
    /// Withdraws a pending reminder; no-op when none exists.
    fn cancel(&self, id: TaskId);
}

/// Counts produced by one `dispatch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub scheduled: usize,
    pub cancelled: usize,
    /// Schedule requests dropped because permission was denied.
    pub skipped: usize,
    pub failed: usize,
}

/// Thin executor of reminder effects.
pub struct ReminderDispatcher<C: ReminderCenter> {
    center: C,
    permission_granted: bool,
}

impl<C: ReminderCenter> ReminderDispatcher<C> {
    /// Builds a dispatcher and queries permission once.
    pub fn new(center: C) -> Self {
        let permission_granted = center.request_permission();
        info!(
            "event=reminder_permission module=reminder status=ok granted={}",
            permission_granted
        );
        Self {
            center,
            permission_granted,
        }
    }

    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    pub fn center(&self) -> &C {
        &self.center
    }

    /// Applies `effects` in order.
    pub fn dispatch(&self, effects: &[ReminderEffect]) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for effect in effects {
            match effect {
                ReminderEffect::Schedule { id, title, fire_at } => {
                    if !self.permission_granted {
                        debug!(
                            "event=reminder_schedule module=reminder status=skipped task_id={} reason=permission_denied",
                            id
                        );
                        summary.skipped += 1;
                        continue;
                    }
                    match self.center.schedule(*id, title, *fire_at) {
                        Ok(()) => {
                            debug!(
                                "event=reminder_schedule module=reminder status=ok task_id={} fire_at={}",
                                id,
                                fire_at.to_rfc3339()
                            );
                            summary.scheduled += 1;
                        }
                        Err(err) => {
                            warn!(
                                "event=reminder_schedule module=reminder status=error task_id={} error={}",
                                id, err
                            );
                            summary.failed += 1;
                        }
                    }
                }
                ReminderEffect::Cancel { id } => {
                    self.center.cancel(*id);
                    debug!(
                        "event=reminder_cancel module=reminder status=ok task_id={}",
                        id
                    );
                    summary.cancelled += 1;
                }
            }
        }
        summary
    }
}

/// Reminder recorded by `InMemoryReminderCenter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReminder {
    pub title: String,
    pub fire_at: DateTime<Utc>,
}

/// Process-local notification facility keyed by task id.
///
/// Used by tests and by shells without a platform notification API.
#[derive(Debug, Default)]
pub struct InMemoryReminderCenter {
    grant_permission: bool,
    pending: RefCell<BTreeMap<TaskId, PendingReminder>>,
    permission_requests: Cell<usize>,
    cancel_requests: Cell<usize>,
}

impl InMemoryReminderCenter {
    pub fn granting() -> Self {
        Self {
            grant_permission: true,
            ..Self::default()
        }
    }

    pub fn denying() -> Self {
        Self::default()
    }

    pub fn pending(&self, id: TaskId) -> Option<PendingReminder> {
        self.pending.borrow().get(&id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.get()
    }

    /// Number of cancel calls received, including ones that matched nothing.
    pub fn cancel_requests(&self) -> usize {
        self.cancel_requests.get()
    }
}

impl ReminderCenter for InMemoryReminderCenter {
    fn request_permission(&self) -> bool {
        self.permission_requests.set(self.permission_requests.get() + 1);
        self.grant_permission
    }

    fn schedule(
        &self,
        id: TaskId,
        title: &str,
        fire_at: DateTime<Utc>,
    ) -> Result<(), ReminderError> {
        self.pending.borrow_mut().insert(
            id,
            PendingReminder {
                title: title.to_string(),
                fire_at,
            },
        );
        Ok(())
    }

    fn cancel(&self, id: TaskId) {
        self.cancel_requests.set(self.cancel_requests.get() + 1);
        self.pending.borrow_mut().remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::{InMemoryReminderCenter, ReminderDispatcher};
    use crate::model::task::TaskId;
    use crate::reminder::ReminderEffect;
    use chrono::{Duration, Utc};

    #[test]
    fn repeated_schedule_for_same_id_supersedes() {
        let dispatcher = ReminderDispatcher::new(InMemoryReminderCenter::granting());
        let id = TaskId::new();
        let first = Utc::now() + Duration::hours(1);
        let second = first + Duration::hours(1);

        dispatcher.dispatch(&[
            ReminderEffect::Schedule {
                id,
                title: "first".to_string(),
                fire_at: first,
            },
            ReminderEffect::Schedule {
                id,
                title: "second".to_string(),
                fire_at: second,
            },
        ]);

        let center = dispatcher.center();
        assert_eq!(center.pending_count(), 1);
        let pending = center.pending(id).expect("reminder should be pending");
        assert_eq!(pending.title, "second");
        assert_eq!(pending.fire_at, second);
    }

    #[test]
    fn cancel_without_pending_reminder_is_noop() {
        let dispatcher = ReminderDispatcher::new(InMemoryReminderCenter::granting());
        let summary = dispatcher.dispatch(&[ReminderEffect::cancel(TaskId::new())]);
        assert_eq!(summary.cancelled, 1);
        assert_eq!(dispatcher.center().pending_count(), 0);
    }
}
