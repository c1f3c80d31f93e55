//! Request and response bodies for the tutord HTTP API.

use crate::task::{TaskCounts, TaskState};
use serde::{Deserialize, Serialize};

/// Message returned alongside a freshly submitted question
pub const ASK_MESSAGE: &str = "Answer generated. Video is being created...";

/// POST /api/ask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub task_id: String,
    pub answer: String,
    pub topic: String,
    pub status: TaskState,
    pub message: String,
}

/// GET /api/status/{task_id}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub task_id: String,
    pub status: TaskState,
    /// Present only when `status == completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Present only when `status == failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall health as reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
        }
    }
}

/// GET /api/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub ollama_running: bool,
    pub model_available: bool,
    pub model: String,
    #[serde(default)]
    pub tasks: TaskCounts,
}

/// GET /api/models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub current_model: String,
    pub available_models: Vec<String>,
}

/// Plain acknowledgement, e.g. POST /api/switch-model/{name}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
