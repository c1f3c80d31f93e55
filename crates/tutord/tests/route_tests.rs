//! HTTP route tests, driven in-process through the axum router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::ServiceExt;
use tutord::answer::{AnswerService, FakeAnswerService};
use tutord::config::ServerConfig;
use tutord::orchestrator::{Orchestrator, OrchestratorConfig};
use tutord::render::{FakeRenderer, Renderer};
use tutord::server::{router, AppState};
use tutord::store::TaskStore;

fn app(answers: FakeAnswerService, renderer: FakeRenderer) -> (Router, Arc<AppState>) {
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(TaskStore::new()),
        Arc::new(answers) as Arc<dyn AnswerService>,
        Arc::new(renderer) as Arc<dyn Renderer>,
        OrchestratorConfig::default(),
    ));
    let state = Arc::new(AppState::new(orchestrator));
    (router(Arc::clone(&state), &ServerConfig::default()), state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post(uri: &str) -> Request<Body> {
    Request::builder().method("POST").uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_ask_returns_processing_task() {
    let (app, state) = app(FakeAnswerService::new(), FakeRenderer::hanging());

    let (status, body) = send(
        &app,
        post_json("/api/ask", serde_json::json!({ "question": "What is the Pythagorean theorem?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "processing");
    assert_eq!(body["topic"], "mathematics");
    assert!(!body["answer"].as_str().unwrap().is_empty());
    assert_eq!(body["message"], "Answer generated. Video is being created...");

    let task_id = body["task_id"].as_str().unwrap().to_string();
    let (status, body) = send(&app, get(&format!("/api/status/{}", task_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task_id"], task_id.as_str());
    assert_eq!(body["status"], "processing");
    assert!(body.get("video_url").is_none());

    state.orchestrator.shutdown(Duration::ZERO).await;
}

#[tokio::test]
async fn test_status_reports_video_url_once_completed() {
    let (app, _state) = app(FakeAnswerService::new(), FakeRenderer::succeeding());

    let (_, body) = send(&app, post_json("/api/ask", serde_json::json!({ "question": "What is a wave?" }))).await;
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let deadline = Instant::now() + Duration::from_secs(5);
    let body = loop {
        let (_, body) = send(&app, get(&format!("/api/status/{}", task_id))).await;
        if body["status"] != "processing" {
            break body;
        }
        assert!(Instant::now() < deadline);
        tokio::time::sleep(Duration::from_millis(10)).await;
    };

    assert_eq!(body["status"], "completed");
    assert_eq!(body["video_url"], format!("/videos/{}.mp4", task_id));
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_unknown_task_is_404() {
    let (app, _state) = app(FakeAnswerService::new(), FakeRenderer::succeeding());

    let (status, body) = send(&app, get("/api/status/deadbeef")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Task not found");
}

#[tokio::test]
async fn test_ask_with_backend_down_is_500_and_creates_nothing() {
    let (app, state) = app(FakeAnswerService::unreachable(), FakeRenderer::succeeding());

    let (status, body) = send(&app, post_json("/api/ask", serde_json::json!({ "question": "What is a vector?" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("unreachable"));
    assert!(state.orchestrator.store().is_empty());
}

#[tokio::test]
async fn test_blank_question_is_400() {
    let (app, _state) = app(FakeAnswerService::new(), FakeRenderer::succeeding());

    let (status, _) = send(&app, post_json("/api/ask", serde_json::json!({ "question": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Scenario D: backend up, model missing
#[tokio::test]
async fn test_health_degraded_without_model() {
    let (app, _state) = app(
        FakeAnswerService::new().with_model_available(false),
        FakeRenderer::succeeding(),
    );

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["ollama_running"], true);
    assert_eq!(body["model_available"], false);
    assert_eq!(body["model"], "mistral:latest");
}

#[tokio::test]
async fn test_health_never_errors_when_backend_down() {
    let (app, _state) = app(FakeAnswerService::unreachable(), FakeRenderer::succeeding());

    let (status, body) = send(&app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["ollama_running"], false);
}

#[tokio::test]
async fn test_models_and_switch() {
    let (app, _state) = app(FakeAnswerService::new(), FakeRenderer::succeeding());

    let (status, body) = send(&app, get("/api/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_model"], "mistral:latest");
    assert_eq!(body["available_models"], serde_json::json!(["mistral:latest"]));

    let (status, body) = send(&app, post("/api/switch-model/llama3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Switched to model: llama3");

    let (_, body) = send(&app, get("/api/models")).await;
    assert_eq!(body["current_model"], "llama3");
}

#[tokio::test]
async fn test_switch_to_unpullable_model_is_400() {
    let (app, _state) = app(
        FakeAnswerService::new().with_pullable(false),
        FakeRenderer::succeeding(),
    );

    let (status, body) = send(&app, post("/api/switch-model/phi3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Model phi3 not available and could not be downloaded");

    let (_, body) = send(&app, get("/api/models")).await;
    assert_eq!(body["current_model"], "mistral:latest");
}
