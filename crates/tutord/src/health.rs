//! Health reporting for the answer backend.
//!
//! A health check never fails: an unreachable backend or missing model is
//! reported through the sub-flags, with the overall status set to degraded.

use crate::answer::{AnswerService, BackendProbe};
use crate::store::TaskStore;
use std::sync::Arc;
use tracing::{info, warn};
use tutor_shared::api::{HealthResponse, HealthStatus};
use tutor_shared::TaskCounts;

/// Result of a health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthView {
    pub healthy: bool,
    pub service_running: bool,
    pub model_available: bool,
    pub model_name: String,
    pub tasks: TaskCounts,
}

impl HealthView {
    pub fn from_probe(probe: BackendProbe, model_name: String, tasks: TaskCounts) -> Self {
        // A model cannot be available on a backend that is not running
        let model_available = probe.service_running && probe.model_available;
        Self {
            healthy: probe.service_running && model_available,
            service_running: probe.service_running,
            model_available,
            model_name,
            tasks,
        }
    }

    pub fn to_response(&self) -> HealthResponse {
        HealthResponse {
            status: if self.healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::Degraded
            },
            ollama_running: self.service_running,
            model_available: self.model_available,
            model: self.model_name.clone(),
            tasks: self.tasks,
        }
    }
}

#[derive(Clone)]
pub struct HealthReporter {
    answers: Arc<dyn AnswerService>,
    store: Arc<TaskStore>,
}

impl HealthReporter {
    pub fn new(answers: Arc<dyn AnswerService>, store: Arc<TaskStore>) -> Self {
        Self { answers, store }
    }

    pub async fn check(&self) -> HealthView {
        let probe = self.answers.probe().await;
        HealthView::from_probe(probe, self.answers.model().await, self.store.counts())
    }

    /// Startup readiness check; pulls the model when allowed and missing
    pub async fn ensure_ready(&self, pull_missing: bool) -> HealthView {
        let view = self.check().await;

        if !view.service_running {
            warn!("Answer backend is not running; answers will fail until it starts");
            return view;
        }
        info!("Answer backend is running");

        if view.model_available {
            info!("Model '{}' is ready", view.model_name);
            return view;
        }

        warn!("Model '{}' not found", view.model_name);
        if !pull_missing {
            return view;
        }

        match self.answers.pull_model(&view.model_name).await {
            Ok(()) => info!("Model '{}' downloaded", view.model_name),
            Err(e) => warn!("Failed to download model '{}': {}", view.model_name, e),
        }
        self.check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::FakeAnswerService;

    fn reporter(fake: FakeAnswerService) -> HealthReporter {
        HealthReporter::new(Arc::new(fake), Arc::new(TaskStore::new()))
    }

    #[tokio::test]
    async fn test_healthy_backend() {
        let view = reporter(FakeAnswerService::new()).check().await;
        assert!(view.healthy);
        assert!(view.service_running);
        assert!(view.model_available);
        assert_eq!(view.model_name, "mistral:latest");
        assert_eq!(view.to_response().status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn test_running_without_model_is_degraded() {
        let view = reporter(FakeAnswerService::new().with_model_available(false))
            .check()
            .await;
        assert!(!view.healthy);
        assert!(view.service_running);
        assert!(!view.model_available);

        let resp = view.to_response();
        assert_eq!(resp.status, HealthStatus::Degraded);
        assert!(resp.ollama_running);
        assert!(!resp.model_available);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_degraded() {
        let view = reporter(FakeAnswerService::unreachable()).check().await;
        assert!(!view.healthy);
        assert!(!view.service_running);
        assert!(!view.model_available);
    }

    #[test]
    fn test_model_flag_cleared_when_service_down() {
        let probe = BackendProbe {
            service_running: false,
            model_available: true,
        };
        let view = HealthView::from_probe(probe, "m".to_string(), TaskCounts::default());
        assert!(!view.model_available);
        assert!(!view.healthy);
    }

    #[tokio::test]
    async fn test_ensure_ready_skips_pull_when_disabled() {
        let view = reporter(FakeAnswerService::new().with_model_available(false))
            .ensure_ready(false)
            .await;
        assert!(!view.model_available);
    }

    #[tokio::test]
    async fn test_ensure_ready_pulls_missing_model() {
        let view = reporter(FakeAnswerService::new().with_model_available(false))
            .ensure_ready(true)
            .await;
        assert!(view.model_available);
        assert!(view.healthy);
    }

    #[tokio::test]
    async fn test_ensure_ready_survives_failed_pull() {
        let fake = FakeAnswerService::new()
            .with_model_available(false)
            .with_pullable(false);
        let view = reporter(fake).ensure_ready(true).await;
        assert!(view.service_running);
        assert!(!view.healthy);
    }
}
