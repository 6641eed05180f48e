//! Reminder effects and their dispatch to a notification facility.
//!
//! # Responsibility
//! - Describe schedule/cancel requests produced by store mutations.
//! - Execute those requests against a platform notification port.
//!
//! # Invariants
//! - The store never calls a notification API directly.
//! - Reminder failures never change store state.

pub mod dispatcher;
pub mod effect;

pub use dispatcher::{
    DispatchSummary, InMemoryReminderCenter, PendingReminder, ReminderCenter, ReminderDispatcher,
    ReminderError,
};
pub use effect::ReminderEffect;
