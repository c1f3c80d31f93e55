//! HTTP client for communicating with tutord.

use anyhow::{anyhow, Context, Result};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tutor_shared::api::{
    AskRequest, AskResponse, ErrorBody, HealthResponse, MessageResponse, ModelsResponse,
    StatusResponse,
};

/// Asking can take as long as the model needs to answer
const ASK_TIMEOUT: Duration = Duration::from_secs(180);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for communicating with tutord
pub struct TutordClient {
    http: reqwest::Client,
    base_url: String,
}

impl TutordClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("cannot build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a question. Returns once the text answer is ready.
    pub async fn ask(&self, question: &str, context: Option<&str>) -> Result<AskResponse> {
        let body = AskRequest {
            question: question.to_string(),
            context: context.map(str::to_string),
        };
        let response = self
            .http
            .post(self.url("/api/ask"))
            .timeout(ASK_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    pub async fn status(&self, task_id: &str) -> Result<StatusResponse> {
        let response = self
            .http
            .get(self.url(&format!("/api/status/{}", task_id)))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .http
            .get(self.url("/api/health"))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    pub async fn models(&self) -> Result<ModelsResponse> {
        let response = self
            .http
            .get(self.url("/api/models"))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    pub async fn switch_model(&self, model: &str) -> Result<MessageResponse> {
        let response = self
            .http
            .post(self.url(&format!("/api/switch-model/{}", model)))
            .timeout(Duration::from_secs(1800))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        decode(response).await
    }

    /// Turn a server-relative `video_url` into one the user can open
    pub fn resolve_video_url(&self, video_url: &str) -> String {
        resolve_url(&self.base_url, video_url)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn unreachable(&self, err: reqwest::Error) -> anyhow::Error {
        anyhow!(
            "Cannot reach tutord at {}: {}\n\n\
             Is the daemon running? Start it with: tutord",
            self.base_url,
            err
        )
    }
}

/// Join a server-relative path onto `base_url`; absolute URLs pass through
pub fn resolve_url(base_url: &str, location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        return location.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if location.starts_with('/') {
        format!("{}{}", base, location)
    } else {
        format!("{}/{}", base, location)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("invalid response from tutord");
    }

    let detail = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.detail)
        .unwrap_or_else(|_| status.to_string());
    match status {
        StatusCode::NOT_FOUND => Err(anyhow!("Not found: {}", detail)),
        _ => Err(anyhow!("tutord returned {}: {}", status.as_u16(), detail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_video_url() {
        assert_eq!(
            resolve_url("http://127.0.0.1:8000/", "/videos/abc12345.mp4"),
            "http://127.0.0.1:8000/videos/abc12345.mp4"
        );
        assert_eq!(
            resolve_url("http://host:9000", "videos/abc12345.mp4"),
            "http://host:9000/videos/abc12345.mp4"
        );
    }

    #[test]
    fn test_absolute_url_passes_through() {
        let url = "https://cdn.example.org/videos/abc12345.mp4";
        assert_eq!(resolve_url("http://127.0.0.1:8000", url), url);
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = TutordClient::new("http://127.0.0.1:8000///").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }
}
