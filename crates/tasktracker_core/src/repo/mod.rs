//! Persistence adapters for the task list.
//!
//! # Responsibility
//! - Define the blob storage contract used by the task store.
//! - Own the persisted JSON format.
//!
//! # Invariants
//! - The whole list is written on every save; there are no partial writes.
//! - Read failures degrade to "nothing saved".

pub mod codec;
pub mod task_storage;
