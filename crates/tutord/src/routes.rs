//! API routes for tutord

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};
use tutor_shared::api::{
    AskRequest, AskResponse, HealthResponse, MessageResponse, ModelsResponse, StatusResponse,
    ASK_MESSAGE,
};
use tutor_shared::TaskState;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Task Routes
// ============================================================================

pub fn task_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/ask", post(ask_question))
        .route("/api/status/:task_id", get(task_status))
}

async fn ask_question(
    State(state): State<AppStateArc>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let submission = state
        .orchestrator
        .submit(&req.question, req.context.as_deref())
        .await?;

    Ok(Json(AskResponse {
        task_id: submission.task_id,
        answer: submission.answer,
        topic: submission.topic,
        status: TaskState::Processing,
        message: ASK_MESSAGE.to_string(),
    }))
}

async fn task_status(
    State(state): State<AppStateArc>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    Ok(Json(state.status.query(&task_id)?))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(state.health.check().await.to_response())
}

// ============================================================================
// Model Routes
// ============================================================================

pub fn model_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/models", get(list_models))
        .route("/api/switch-model/:model_name", post(switch_model))
}

async fn list_models(State(state): State<AppStateArc>) -> Result<Json<ModelsResponse>, ApiError> {
    let answers = state.orchestrator.answers();
    let available_models = answers
        .list_models()
        .await
        .map_err(|e| ApiError::AnswerUnavailable(e.to_string()))?;

    Ok(Json(ModelsResponse {
        current_model: answers.model().await,
        available_models,
    }))
}

async fn switch_model(
    State(state): State<AppStateArc>,
    Path(model_name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let answers = state.orchestrator.answers();
    let available = answers.list_models().await.unwrap_or_default();

    if !available.contains(&model_name) {
        info!("Model {} not installed, pulling", model_name);
        if let Err(e) = answers.pull_model(&model_name).await {
            warn!("Pull of {} failed: {}", model_name, e);
            return Err(ApiError::ModelUnavailable(model_name));
        }
    }

    answers.set_model(&model_name).await;
    Ok(Json(MessageResponse {
        message: format!("Switched to model: {}", model_name),
    }))
}
