//! Persisted task list format.
//!
//! # Responsibility
//! - Encode the task list as a JSON array in insertion order.
//! - Decode tolerantly: unknown fields are ignored, `isCompleted` and
//!   `dueDate` may be missing.
//!
//! # Invariants
//! - `decode_tasks(&encode_tasks(list)?)? == list` for every task list.
//! - Timestamps are written as RFC 3339 UTC strings.

use crate::model::task::Task;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CodecError {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode task list: {err}"),
            Self::Decode(err) => write!(f, "failed to decode task list: {err}"),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
        }
    }
}

pub fn encode_tasks(tasks: &[Task]) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(tasks).map_err(CodecError::Encode)
}

pub fn decode_tasks(bytes: &[u8]) -> Result<Vec<Task>, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}
