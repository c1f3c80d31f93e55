//! Error types for task bookkeeping.

use crate::task::TaskState;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    /// A transition out of a terminal state was attempted
    #[error("Invalid transition for task {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: TaskState,
        to: TaskState,
    },
}

impl TaskError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, TaskError::NotFound(_))
    }
}
