//! Ollama-backed answer service.

use super::prompt::{build_prompt, classify_topic};
use super::{Answer, AnswerError, AnswerService, BackendProbe};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Model downloads can take a long time
const PULL_TIMEOUT: Duration = Duration::from_secs(1800);

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Answer service talking to an Ollama HTTP API
pub struct OllamaAnswerService {
    client: reqwest::Client,
    base_url: String,
    model: RwLock<String>,
    temperature: f32,
    max_tokens: u32,
    context_window: u32,
    answer_timeout: Duration,
    probe_timeout: Duration,
}

impl OllamaAnswerService {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: RwLock::new(config.model.clone()),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            context_window: config.context_window,
            answer_timeout: Duration::from_secs(config.answer_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }

    async fn tags(&self) -> Result<Vec<String>, AnswerError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(self.probe_timeout)
            .send()
            .await?
            .error_for_status()?;

        let tags: TagsResponse = response.json().await?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// `mistral` matches an installed `mistral:latest` but not `mistral-nemo:latest`
fn has_model(installed: &[String], model: &str) -> bool {
    installed.iter().any(|name| {
        name == model
            || name
                .strip_prefix(model)
                .is_some_and(|tag| tag.starts_with(':'))
    })
}

#[async_trait]
impl AnswerService for OllamaAnswerService {
    async fn answer(&self, question: &str, context: Option<&str>) -> Result<Answer, AnswerError> {
        let model = self.model().await;
        let body = serde_json::json!({
            "model": model,
            "prompt": build_prompt(question, context),
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "num_predict": self.max_tokens,
                "num_ctx": self.context_window,
            }
        });

        debug!("Requesting answer from {} ({})", self.base_url, model);
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .timeout(self.answer_timeout)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnswerError::Status(response.status().to_string()));
        }

        let generated: GenerateResponse = response.json().await?;
        let answer = generated.response.trim().to_string();
        if answer.is_empty() {
            return Err(AnswerError::EmptyAnswer);
        }

        Ok(Answer {
            answer,
            topic: classify_topic(question),
        })
    }

    async fn probe(&self) -> BackendProbe {
        match self.tags().await {
            Ok(installed) => {
                let model = self.model().await;
                BackendProbe {
                    service_running: true,
                    model_available: has_model(&installed, &model),
                }
            }
            Err(e) => {
                debug!("Ollama probe failed: {}", e);
                BackendProbe::default()
            }
        }
    }

    async fn model(&self) -> String {
        self.model.read().await.clone()
    }

    async fn list_models(&self) -> Result<Vec<String>, AnswerError> {
        self.tags().await
    }

    async fn pull_model(&self, model: &str) -> Result<(), AnswerError> {
        info!("Pulling model: {}", model);

        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .timeout(PULL_TIMEOUT)
            .json(&serde_json::json!({ "name": model, "stream": false }))
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Failed to pull model {}: {}", model, response.status());
            return Err(AnswerError::Status(response.status().to_string()));
        }

        info!("Model {} pulled successfully", model);
        Ok(())
    }

    async fn set_model(&self, model: &str) {
        info!("Switching answer model to {}", model);
        *self.model.write().await = model.to_string();
    }
}
