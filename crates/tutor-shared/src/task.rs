//! Task types for the answer/render workflow.
//!
//! Every submitted question becomes a Task. The text answer is attached at
//! creation; the rendered video arrives later through a single transition
//! to a terminal state.

use crate::error::TaskError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length of a task id in hex characters
pub const TASK_ID_LEN: usize = 8;

/// Generate a short task id from a random v4 UUID
pub fn generate_task_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(TASK_ID_LEN);
    id
}

/// Task lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Answer delivered, video still rendering
    #[default]
    Processing,
    /// Video rendered, artifact location known
    Completed,
    /// Render failed or timed out
    Failed,
}

impl TaskState {
    /// Terminal states never transition again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// One question, its answer, and the state of its video
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub state: TaskState,
    /// Original question text
    pub question: String,
    pub answer: String,
    pub topic: String,
    /// Set only when `state == Completed`
    pub artifact_location: Option<String>,
    /// Set only when `state == Failed`
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    /// When the task reached a terminal state
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a task in the `processing` state
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            state: TaskState::Processing,
            question: question.into(),
            answer: answer.into(),
            topic: topic.into(),
            artifact_location: None,
            failure_reason: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Transition `processing -> completed`
    pub fn complete(&mut self, artifact_location: impl Into<String>) -> Result<(), TaskError> {
        self.guard(TaskState::Completed)?;
        self.state = TaskState::Completed;
        self.artifact_location = Some(artifact_location.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Transition `processing -> failed`
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), TaskError> {
        self.guard(TaskState::Failed)?;
        self.state = TaskState::Failed;
        self.failure_reason = Some(reason.into());
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn guard(&self, to: TaskState) -> Result<(), TaskError> {
        if self.state.is_terminal() {
            return Err(TaskError::InvalidTransition {
                id: self.id.clone(),
                from: self.state,
                to,
            });
        }
        Ok(())
    }
}

/// Number of known tasks per state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Processing => self.processing += 1,
            TaskState::Completed => self.completed += 1,
            TaskState::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.processing + self.completed + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_processing() {
        let task = Task::new("abc12345", "q", "a", "General");
        assert_eq!(task.state, TaskState::Processing);
        assert!(task.artifact_location.is_none());
        assert!(task.failure_reason.is_none());
    }

    #[test]
    fn test_generated_id_is_short_hex() {
        let id = generate_task_id();
        assert_eq!(id.len(), TASK_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&TaskState::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }

    #[test]
    fn test_counts_total() {
        let mut counts = TaskCounts::default();
        counts.record(TaskState::Processing);
        counts.record(TaskState::Failed);
        counts.record(TaskState::Failed);
        assert_eq!(counts.failed, 2);
        assert_eq!(counts.total(), 3);
    }
}
