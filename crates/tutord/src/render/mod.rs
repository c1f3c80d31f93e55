//! Video renderer abstraction.
//!
//! Production code uses [`CommandRenderer`], which hands the job to an
//! external program. Test code uses [`FakeRenderer`].

mod command;
pub mod script;

pub use command::CommandRenderer;

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Everything a renderer needs to produce one video
#[derive(Debug, Clone, Serialize)]
pub struct RenderJob {
    pub task_id: String,
    pub topic: String,
    pub answer: String,
    /// Story beats derived from the answer
    pub scenes: Vec<String>,
    /// Where the artifact must be written
    pub output: PathBuf,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("renderer exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("renderer produced no artifact at {0}")]
    MissingArtifact(PathBuf),

    #[error("renderer IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Failed(String),
}

/// Anything that can turn a render job into a video file
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `job`, returning the path of the written artifact
    async fn render(&self, job: &RenderJob) -> Result<PathBuf, RenderError>;
}

// ============================================================================
// Fake Renderer (Testing)
// ============================================================================

/// Behaviour of a [`FakeRenderer`]
#[derive(Debug, Clone)]
pub enum FakeRenderMode {
    /// Succeed after an optional delay
    Succeed(Option<Duration>),
    /// Fail with the given reason
    Fail(String),
    /// Never finish
    Hang,
    /// Panic inside the render task
    Panic,
}

/// Fake renderer for deterministic testing
///
/// Counts renders per task id and tracks the peak number of renders
/// running at once, without touching the filesystem.
pub struct FakeRenderer {
    mode: FakeRenderMode,
    calls: Mutex<HashMap<String, usize>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeRenderer {
    pub fn new(mode: FakeRenderMode) -> Self {
        Self {
            mode,
            calls: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(FakeRenderMode::Succeed(None))
    }

    pub fn slow(delay: Duration) -> Self {
        Self::new(FakeRenderMode::Succeed(Some(delay)))
    }

    pub fn failing(reason: &str) -> Self {
        Self::new(FakeRenderMode::Fail(reason.to_string()))
    }

    pub fn hanging() -> Self {
        Self::new(FakeRenderMode::Hang)
    }

    /// How many times `task_id` was rendered
    pub fn calls_for(&self, task_id: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(task_id).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    /// Highest number of renders observed running together
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Decrements the active counter even if the render future is dropped
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(&self, job: &RenderJob) -> Result<PathBuf, RenderError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(job.task_id.clone()).or_insert(0) += 1;
        }

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _guard = ActiveGuard(&self.active);

        match &self.mode {
            FakeRenderMode::Succeed(delay) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(*delay).await;
                }
                Ok(job.output.clone())
            }
            FakeRenderMode::Fail(reason) => Err(RenderError::Failed(reason.clone())),
            FakeRenderMode::Hang => std::future::pending().await,
            FakeRenderMode::Panic => panic!("fake renderer panic for {}", job.task_id),
        }
    }
}
