//! Configuration management for tutord.
//!
//! Loads settings from an explicit path, `$TUTOR_CONFIG`, or
//! /etc/tutor/config.toml, falling back to defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tutor_shared::DEFAULT_PORT;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/tutor/config.toml";

/// Environment variable overriding the config path
pub const CONFIG_ENV: &str = "TUTOR_CONFIG";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory rendered videos are written to and served from
    #[serde(default = "default_videos_dir")]
    pub videos_dir: PathBuf,

    /// Optional web front end served at `/`
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_videos_dir() -> PathBuf {
    PathBuf::from("videos")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            videos_dir: default_videos_dir(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Answer backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_context_window")]
    pub context_window: u32,

    /// Answer generation timeout in seconds
    #[serde(default = "default_answer_timeout")]
    pub answer_timeout_secs: u64,

    /// Health probe timeout in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Pull the configured model at startup if it is missing
    #[serde(default = "default_true")]
    pub pull_missing_model: bool,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_model() -> String {
    "mistral:latest".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    500
}

fn default_context_window() -> u32 {
    2048
}

fn default_answer_timeout() -> u64 {
    120
}

fn default_probe_timeout() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_window: default_context_window(),
            answer_timeout_secs: default_answer_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            pull_missing_model: default_true(),
        }
    }
}

/// Video renderer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Renderer program
    #[serde(default = "default_render_command")]
    pub command: String,

    /// Arguments; `{task_id}`, `{topic}` and `{output}` are substituted
    #[serde(default = "default_render_args")]
    pub args: Vec<String>,

    /// Artifact file extension
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Per-render timeout in seconds
    #[serde(default = "default_render_timeout")]
    pub timeout_secs: u64,

    /// Renders allowed to run at once; the rest queue
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_render_command() -> String {
    "tutor-render".to_string()
}

fn default_render_args() -> Vec<String> {
    vec![
        "--task-id".to_string(),
        "{task_id}".to_string(),
        "--output".to_string(),
        "{output}".to_string(),
    ]
}

fn default_extension() -> String {
    "mp4".to_string()
}

fn default_render_timeout() -> u64 {
    600
}

fn default_max_concurrent() -> usize {
    2
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            command: default_render_command(),
            args: default_render_args(),
            extension: default_extension(),
            timeout_secs: default_render_timeout(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Task retention and shutdown policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Terminal tasks older than this are dropped
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// How long shutdown waits for in-flight renders
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

fn default_retention() -> u64 {
    86_400
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_shutdown_grace() -> u64 {
    30
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention(),
            sweep_interval_secs: default_sweep_interval(),
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

/// Top-level tutord configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub tasks: TaskConfig,
}

impl Config {
    /// Load config: explicit path, then `$TUTOR_CONFIG`, then CONFIG_PATH, then defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_path(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from_path(Path::new(&path));
        }

        Ok(Self::load_from_path(Path::new(CONFIG_PATH)).unwrap_or_else(|e| {
            warn!("Config not found, using defaults: {}", e);
            Config::default()
        }))
    }

    /// Load config from specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn answer_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.answer_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render.timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.tasks.retention_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.tasks.sweep_interval_secs.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.tasks.shutdown_grace_secs)
    }
}
