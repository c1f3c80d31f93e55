//! In-memory task store.
//!
//! The store owns every Task record. Writers for one task id are serialised
//! by the map's per-shard locks; reads and writes to different ids do not
//! contend beyond their shard. Every mutation goes through the Task's own
//! transition guard, so a terminal task can never be re-entered.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use tutor_shared::task::generate_task_id;
use tutor_shared::{Task, TaskCounts, TaskError};

/// Thread-safe task store
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: DashMap<String, Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: DashMap::new(),
        }
    }

    /// Allocate a new task in `processing` and return its id
    pub fn create(&self, question: &str, answer: &str, topic: &str) -> String {
        loop {
            let id = generate_task_id();
            // Insert only into a vacant slot so two creations never share an id
            match self.tasks.entry(id.clone()) {
                Entry::Occupied(_) => {
                    debug!("Task id collision on {}, regenerating", id);
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(Task::new(id.clone(), question, answer, topic));
                    return id;
                }
            }
        }
    }

    /// Snapshot of a task
    pub fn get(&self, task_id: &str) -> Result<Task, TaskError> {
        self.tasks
            .get(task_id)
            .map(|task| task.value().clone())
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))
    }

    /// Transition `processing -> completed`
    pub fn complete(&self, task_id: &str, artifact_location: &str) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        task.complete(artifact_location)
    }

    /// Transition `processing -> failed`
    pub fn fail(&self, task_id: &str, reason: &str) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        task.fail(reason)
    }

    pub fn counts(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for task in self.tasks.iter() {
            counts.record(task.state);
        }
        counts
    }

    /// Drop tasks that finished more than `retention` ago. Returns how many were removed.
    pub fn prune_expired(&self, retention: Duration) -> usize {
        let now = chrono::Utc::now();
        let before = self.tasks.len();

        self.tasks.retain(|_, task| {
            // Age counts from the terminal transition, not from creation
            let Some(finished_at) = task.finished_at else {
                return true;
            };
            let expired = now
                .signed_duration_since(finished_at)
                .to_std()
                .map(|age| age >= retention)
                .unwrap_or(false);
            !expired
        });

        before.saturating_sub(self.tasks.len())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Periodically prune expired tasks until the returned handle is aborted
pub fn spawn_sweeper(store: Arc<TaskStore>, retention: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // First tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.prune_expired(retention);
            if removed > 0 {
                info!("Pruned {} expired tasks", removed);
            } else {
                debug!("Sweep found no expired tasks ({} held)", store.len());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_shared::TaskState;

    #[test]
    fn test_create_then_get() {
        let store = TaskStore::new();
        let id = store.create("What is gravity?", "Gravity is...", "Physics");

        let task = store.get(&id).unwrap();
        assert_eq!(task.id, id);
        assert_eq!(task.state, TaskState::Processing);
        assert_eq!(task.question, "What is gravity?");
        assert_eq!(task.topic, "Physics");
    }

    #[test]
    fn test_unknown_id_not_found() {
        let store = TaskStore::new();
        assert_eq!(
            store.get("missing").unwrap_err(),
            TaskError::NotFound("missing".to_string())
        );
        assert!(store.complete("missing", "/videos/missing.mp4").unwrap_err().is_not_found());
        assert!(store.fail("missing", "boom").unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_completion_rejected() {
        let store = TaskStore::new();
        let id = store.create("q", "a", "General");

        store.complete(&id, "/videos/a.mp4").unwrap();
        assert!(matches!(
            store.complete(&id, "/videos/b.mp4"),
            Err(TaskError::InvalidTransition { .. })
        ));
        assert!(store.fail(&id, "late").is_err());

        let task = store.get(&id).unwrap();
        assert_eq!(task.artifact_location.as_deref(), Some("/videos/a.mp4"));
    }

    #[test]
    fn test_counts() {
        let store = TaskStore::new();
        let a = store.create("a", "a", "General");
        let b = store.create("b", "b", "General");
        let c = store.create("c", "c", "General");
        store.complete(&a, "/videos/a.mp4").unwrap();
        store.fail(&b, "boom").unwrap();

        let counts = store.counts();
        assert_eq!(counts.processing, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(store.get(&c).unwrap().state, TaskState::Processing);
    }

    #[test]
    fn test_prune_keeps_processing_tasks() {
        let store = TaskStore::new();
        let done = store.create("a", "a", "General");
        let pending = store.create("b", "b", "General");
        store.complete(&done, "/videos/a.mp4").unwrap();

        let removed = store.prune_expired(Duration::ZERO);
        assert_eq!(removed, 1);
        assert!(store.get(&done).unwrap_err().is_not_found());
        assert!(store.get(&pending).is_ok());
    }

    #[test]
    fn test_prune_respects_retention() {
        let store = TaskStore::new();
        let id = store.create("a", "a", "General");
        store.fail(&id, "boom").unwrap();

        assert_eq!(store.prune_expired(Duration::from_secs(3600)), 0);
        assert!(store.get(&id).is_ok());
    }

    #[test]
    fn test_long_render_survives_sweep_after_completion() {
        let store = TaskStore::new();
        let id = store.create("q", "a", "General");

        // Render outlives the retention window
        std::thread::sleep(Duration::from_millis(300));
        store.complete(&id, "/videos/q.mp4").unwrap();

        assert_eq!(store.prune_expired(Duration::from_millis(200)), 0);
        assert_eq!(store.get(&id).unwrap().state, TaskState::Completed);
    }

    #[test]
    fn test_concurrent_creates_produce_distinct_ids() {
        let store = Arc::new(TaskStore::new());
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    (0..250)
                        .map(|i| store.create(&format!("q{}-{}", n, i), "a", "General"))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 2000);
        assert_eq!(store.len(), 2000);
    }

    #[tokio::test]
    async fn test_sweeper_prunes_in_background() {
        let store = Arc::new(TaskStore::new());
        let id = store.create("a", "a", "General");
        store.complete(&id, "/videos/a.mp4").unwrap();

        let handle = spawn_sweeper(Arc::clone(&store), Duration::ZERO, Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(store.is_empty());
    }
}
