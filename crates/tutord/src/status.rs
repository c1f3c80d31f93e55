//! Read-only status view over the task store.

use crate::store::TaskStore;
use std::sync::Arc;
use tutor_shared::api::StatusResponse;
use tutor_shared::{Task, TaskError, TaskState};

/// Polling surface for clients
#[derive(Clone)]
pub struct StatusEndpoint {
    store: Arc<TaskStore>,
}

impl StatusEndpoint {
    pub fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Current client-facing view of a task
    pub fn query(&self, task_id: &str) -> Result<StatusResponse, TaskError> {
        self.store.get(task_id).map(|task| status_view(&task))
    }
}

/// `video_url` only for completed tasks, `error` only for failed ones
pub fn status_view(task: &Task) -> StatusResponse {
    StatusResponse {
        task_id: task.id.clone(),
        status: task.state,
        video_url: match task.state {
            TaskState::Completed => task.artifact_location.clone(),
            _ => None,
        },
        answer: Some(task.answer.clone()),
        error: match task.state {
            TaskState::Failed => task.failure_reason.clone(),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_processing_task() {
        let store = Arc::new(TaskStore::new());
        let id = store.create("What is a derivative?", "The rate of change.", "General");
        let endpoint = StatusEndpoint::new(Arc::clone(&store));

        let view = endpoint.query(&id).unwrap();
        assert_eq!(view.task_id, id);
        assert_eq!(view.status, TaskState::Processing);
        assert!(view.video_url.is_none());
        assert!(view.error.is_none());
        assert_eq!(view.answer.as_deref(), Some("The rate of change."));
    }

    #[test]
    fn test_query_reflects_completion() {
        let store = Arc::new(TaskStore::new());
        let id = store.create("q", "a", "General");
        let endpoint = StatusEndpoint::new(Arc::clone(&store));

        store.complete(&id, "/videos/x.mp4").unwrap();
        let view = endpoint.query(&id).unwrap();
        assert_eq!(view.status, TaskState::Completed);
        assert_eq!(view.video_url.as_deref(), Some("/videos/x.mp4"));

        // Repeated reads are stable
        assert_eq!(endpoint.query(&id).unwrap(), view);
    }

    #[test]
    fn test_query_failed_has_error_not_url() {
        let store = Arc::new(TaskStore::new());
        let id = store.create("q", "a", "General");
        store.fail(&id, "timeout").unwrap();

        let view = StatusEndpoint::new(store).query(&id).unwrap();
        assert_eq!(view.status, TaskState::Failed);
        assert!(view.video_url.is_none());
        assert_eq!(view.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_query_unknown_id() {
        let endpoint = StatusEndpoint::new(Arc::new(TaskStore::new()));
        assert!(endpoint.query("nope").unwrap_err().is_not_found());
    }
}
