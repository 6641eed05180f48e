//! Domain model for the task store.
//!
//! # Responsibility
//! - Define canonical data structures used by store logic.
//! - Define the explicit create/edit form mode consumed by UI callers.
//!
//! # Invariants
//! - Every task is identified by a stable, non-nil `TaskId`.
//! - Deletion removes the record; there are no tombstones.

pub mod form;
pub mod task;
