//! Flutter bridge for the TaskTracker core.

pub mod api;
