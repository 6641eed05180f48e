//! Task store use-cases.
//!
//! # Responsibility
//! - Orchestrate validation, persistence and reminder effects per mutation.
//! - Provide display projections over the canonical list.
//!
//! # Invariants
//! - Service code stays storage-agnostic and notification-agnostic.

pub mod ordering;
pub mod task_store;
