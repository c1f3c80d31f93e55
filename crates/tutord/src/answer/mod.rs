//! Answer service abstraction.
//!
//! The orchestrator only needs a text answer and a topic for a question,
//! plus enough of the backend's state to report health and manage models.
//! Production code uses [`OllamaAnswerService`]; tests use
//! [`FakeAnswerService`] with pre-configured behaviour.

mod ollama;
pub mod prompt;

pub use ollama::OllamaAnswerService;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

/// Text answer plus topic classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub answer: String,
    pub topic: String,
}

/// Reachability of the answer backend and its model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendProbe {
    pub service_running: bool,
    pub model_available: bool,
}

#[derive(Error, Debug)]
pub enum AnswerError {
    #[error("Answer backend unreachable: {0}")]
    Unreachable(String),

    #[error("Answer backend returned {0}")]
    Status(String),

    #[error("Answer backend returned an empty answer")]
    EmptyAnswer,

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for AnswerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AnswerError::InvalidResponse(err.to_string())
        } else if let Some(status) = err.status() {
            AnswerError::Status(status.to_string())
        } else {
            AnswerError::Unreachable(err.to_string())
        }
    }
}

/// Anything that can answer a question and report on its model
#[async_trait]
pub trait AnswerService: Send + Sync {
    /// Generate an answer for `question`, with optional extra context
    async fn answer(&self, question: &str, context: Option<&str>) -> Result<Answer, AnswerError>;

    /// Probe backend liveness and model presence. Never fails.
    async fn probe(&self) -> BackendProbe;

    /// Currently selected model
    async fn model(&self) -> String;

    async fn list_models(&self) -> Result<Vec<String>, AnswerError>;

    /// Download a model into the backend
    async fn pull_model(&self, model: &str) -> Result<(), AnswerError>;

    /// Switch the model used for subsequent answers
    async fn set_model(&self, model: &str);
}

// ============================================================================
// Fake Answer Service (Testing)
// ============================================================================

/// Fake answer service for deterministic testing
///
/// Answers echo the question so concurrent submissions can be told apart.
/// Topics come from the real classifier.
///
/// ```rust,ignore
/// let fake = FakeAnswerService::new().with_model_available(false);
/// assert!(!fake.probe().await.model_available);
/// ```
pub struct FakeAnswerService {
    model: RwLock<String>,
    models: RwLock<Vec<String>>,
    reachable: bool,
    pullable: bool,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl FakeAnswerService {
    pub fn new() -> Self {
        Self {
            model: RwLock::new("mistral:latest".to_string()),
            models: RwLock::new(vec!["mistral:latest".to_string()]),
            reachable: true,
            pullable: true,
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Backend down: every answer fails and the probe reports not running
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Whether the current model is installed
    pub fn with_model_available(self, available: bool) -> Self {
        let models = if available {
            vec!["mistral:latest".to_string()]
        } else {
            Vec::new()
        };
        Self {
            models: RwLock::new(models),
            ..self
        }
    }

    /// Whether `pull_model` succeeds
    pub fn with_pullable(mut self, pullable: bool) -> Self {
        self.pullable = pullable;
        self
    }

    /// Delay every answer, e.g. to exercise timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of `answer` calls made so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FakeAnswerService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnswerService for FakeAnswerService {
    async fn answer(&self, question: &str, _context: Option<&str>) -> Result<Answer, AnswerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if !self.reachable {
            return Err(AnswerError::Unreachable("connection refused".to_string()));
        }
        Ok(Answer {
            answer: format!("Answer to: {}", question),
            topic: prompt::classify_topic(question),
        })
    }

    async fn probe(&self) -> BackendProbe {
        let model = self.model().await;
        BackendProbe {
            service_running: self.reachable,
            model_available: self.reachable && self.models.read().await.contains(&model),
        }
    }

    async fn model(&self) -> String {
        self.model.read().await.clone()
    }

    async fn list_models(&self) -> Result<Vec<String>, AnswerError> {
        if !self.reachable {
            return Err(AnswerError::Unreachable("connection refused".to_string()));
        }
        Ok(self.models.read().await.clone())
    }

    async fn pull_model(&self, model: &str) -> Result<(), AnswerError> {
        if !self.reachable || !self.pullable {
            return Err(AnswerError::Status(format!("cannot pull {}", model)));
        }
        self.models.write().await.push(model.to_string());
        Ok(())
    }

    async fn set_model(&self, model: &str) {
        *self.model.write().await = model.to_string();
    }
}
