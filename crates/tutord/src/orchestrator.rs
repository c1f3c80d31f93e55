//! Task orchestration.
//!
//! `submit` answers a question inline, records a task, and hands the slow
//! video render to a background unit of work. The render continuation is
//! the only writer of a task after creation and transitions it exactly once.
//!
//! Renders run on a bounded pool: at most `max_concurrent_renders` run at a
//! time, the rest wait (their tasks stay `processing`). Each render carries
//! its own timeout, counted from the moment it starts running.

use crate::answer::AnswerService;
use crate::config::Config;
use crate::render::script::scenes_from_answer;
use crate::render::{RenderJob, Renderer};
use crate::store::TaskStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{AbortHandle, JoinSet};
use tracing::{error, info, warn};
use tutor_shared::video_location;

/// Failure reason recorded when a render exceeds its timeout
pub const REASON_TIMEOUT: &str = "timeout";

/// Failure reason recorded when the render task panics
pub const REASON_PANICKED: &str = "render task panicked";

/// Failure reason recorded when shutdown cuts a render short
pub const REASON_SHUTDOWN: &str = "shutdown";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Question must not be empty")]
    InvalidQuestion,

    #[error("Answer service unavailable: {0}")]
    AnswerUnavailable(String),
}

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub task_id: String,
    pub answer: String,
    pub topic: String,
}

/// Orchestrator tuning
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub answer_timeout: Duration,
    pub render_timeout: Duration,
    pub max_concurrent_renders: usize,
    /// Directory artifacts are written into
    pub videos_dir: PathBuf,
    pub extension: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        Self {
            answer_timeout: config.answer_timeout(),
            render_timeout: config.render_timeout(),
            max_concurrent_renders: config.render.max_concurrent.max(1),
            videos_dir: config.server.videos_dir.clone(),
            extension: config.render.extension.clone(),
        }
    }
}

pub struct Orchestrator {
    store: Arc<TaskStore>,
    answers: Arc<dyn AnswerService>,
    renderer: Arc<dyn Renderer>,
    permits: Arc<Semaphore>,
    renders: Mutex<JoinSet<()>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        store: Arc<TaskStore>,
        answers: Arc<dyn AnswerService>,
        renderer: Arc<dyn Renderer>,
        config: OrchestratorConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_renders.max(1)));
        Self {
            store,
            answers,
            renderer,
            permits,
            renders: Mutex::new(JoinSet::new()),
            config,
        }
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn answers(&self) -> &Arc<dyn AnswerService> {
        &self.answers
    }

    /// Answer `question` and start rendering its video.
    ///
    /// No task is created when the answer cannot be obtained. The task keeps
    /// `question` exactly as given.
    pub async fn submit(
        &self,
        question: &str,
        context: Option<&str>,
    ) -> Result<Submission, SubmitError> {
        let trimmed = question.trim();
        if trimmed.is_empty() {
            return Err(SubmitError::InvalidQuestion);
        }

        info!("Processing question: {}", trimmed);
        let answer = match tokio::time::timeout(
            self.config.answer_timeout,
            self.answers.answer(trimmed, context),
        )
        .await
        {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                error!("Answer generation failed: {}", e);
                return Err(SubmitError::AnswerUnavailable(e.to_string()));
            }
            Err(_) => {
                warn!(
                    "Answer generation timed out after {}s",
                    self.config.answer_timeout.as_secs()
                );
                return Err(SubmitError::AnswerUnavailable(REASON_TIMEOUT.to_string()));
            }
        };

        let task_id = self.store.create(question, &answer.answer, &answer.topic);
        info!("Task {} created (topic: {})", task_id, answer.topic);

        self.schedule_render(RenderJob {
            task_id: task_id.clone(),
            topic: answer.topic.clone(),
            answer: answer.answer.clone(),
            scenes: scenes_from_answer(&answer.answer),
            output: self
                .config
                .videos_dir
                .join(format!("{}.{}", task_id, self.config.extension)),
        });

        Ok(Submission {
            task_id,
            answer: answer.answer,
            topic: answer.topic,
        })
    }

    fn schedule_render(&self, job: RenderJob) {
        let ctx = RenderContext {
            store: Arc::clone(&self.store),
            renderer: Arc::clone(&self.renderer),
            permits: Arc::clone(&self.permits),
            timeout: self.config.render_timeout,
            location: video_location(&job.task_id, &self.config.extension),
        };

        let mut renders = self.renders.lock().unwrap_or_else(|e| e.into_inner());
        // Reap finished renders so the set only holds live work
        while renders.try_join_next().is_some() {}
        renders.spawn(run_render(ctx, job));
    }

    /// Renders scheduled and not yet finished
    pub fn pending_renders(&self) -> usize {
        let mut renders = self.renders.lock().unwrap_or_else(|e| e.into_inner());
        while renders.try_join_next().is_some() {}
        renders.len()
    }

    /// Wait up to `grace` for scheduled renders, then abort the rest.
    ///
    /// Aborted renders leave their tasks `failed` with reason `"shutdown"`.
    pub async fn shutdown(&self, grace: Duration) {
        let mut renders = {
            let mut guard = self.renders.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        if renders.is_empty() {
            return;
        }

        info!("Waiting up to {}s for {} renders", grace.as_secs(), renders.len());
        let drained = tokio::time::timeout(grace, async {
            while renders.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!("Aborting {} unfinished renders", renders.len());
            renders.abort_all();
            while renders.join_next().await.is_some() {}
        }
    }
}

struct RenderContext {
    store: Arc<TaskStore>,
    renderer: Arc<dyn Renderer>,
    permits: Arc<Semaphore>,
    timeout: Duration,
    /// Public artifact location published on success
    location: String,
}

/// Fails the task if the render continuation is dropped before finishing
struct CancelGuard {
    store: Arc<TaskStore>,
    task_id: String,
    inner: Option<AbortHandle>,
    armed: bool,
}

impl CancelGuard {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(inner) = self.inner.take() {
            inner.abort();
        }
        if self.store.fail(&self.task_id, REASON_SHUTDOWN).is_ok() {
            warn!("Render for task {} cancelled", self.task_id);
        }
    }
}

async fn run_render(ctx: RenderContext, job: RenderJob) {
    let task_id = job.task_id.clone();
    let mut guard = CancelGuard {
        store: Arc::clone(&ctx.store),
        task_id: task_id.clone(),
        inner: None,
        armed: true,
    };

    let permit = match Arc::clone(&ctx.permits).acquire_owned().await {
        Ok(permit) => permit,
        Err(_) => {
            guard.disarm();
            finish(&ctx.store, &task_id, ctx.store.fail(&task_id, "render pool closed"));
            return;
        }
    };

    info!("Rendering video for task {}", task_id);
    let renderer = Arc::clone(&ctx.renderer);
    let limit = ctx.timeout;
    // Separate task so a panicking renderer is observed as a JoinError
    let handle = tokio::spawn(async move {
        let _permit = permit;
        tokio::time::timeout(limit, renderer.render(&job)).await
    });
    guard.inner = Some(handle.abort_handle());

    let outcome = match handle.await {
        Ok(Ok(Ok(path))) => {
            info!("Video task {} completed ({})", task_id, path.display());
            ctx.store.complete(&task_id, &ctx.location)
        }
        Ok(Ok(Err(e))) => {
            error!("Video task {} failed: {}", task_id, e);
            ctx.store.fail(&task_id, &e.to_string())
        }
        Ok(Err(_)) => {
            warn!("Video task {} timed out after {}s", task_id, limit.as_secs());
            ctx.store.fail(&task_id, REASON_TIMEOUT)
        }
        Err(e) if e.is_panic() => {
            error!("Video task {} panicked", task_id);
            ctx.store.fail(&task_id, REASON_PANICKED)
        }
        Err(_) => ctx.store.fail(&task_id, REASON_SHUTDOWN),
    };
    guard.disarm();
    finish(&ctx.store, &task_id, outcome);
}

/// A rejected transition means a task was finished twice
fn finish(store: &TaskStore, task_id: &str, outcome: Result<(), tutor_shared::TaskError>) {
    if let Err(e) = outcome {
        warn!("Render outcome for task {} rejected: {}", task_id, e);
        if cfg!(debug_assertions) {
            let current = store.get(task_id).map(|t| t.state.to_string());
            panic!("task {} finished twice (now {:?}): {}", task_id, current, e);
        }
    }
}
