//! Tutor Daemon - answers questions and renders explainer videos.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tutord::answer::OllamaAnswerService;
use tutord::config::Config;
use tutord::orchestrator::{Orchestrator, OrchestratorConfig};
use tutord::render::CommandRenderer;
use tutord::server::{self, AppState};
use tutord::store::TaskStore;

#[derive(Parser)]
#[command(name = "tutord")]
#[command(about = "Tutor daemon - text answers now, animated videos later", long_about = None)]
#[command(version = tutor_shared::VERSION)]
struct Args {
    /// Config file (defaults to $TUTOR_CONFIG or /etc/tutor/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    info!("Tutor Daemon v{} starting", tutor_shared::VERSION);

    let config = Config::load(args.config.as_deref())?;
    std::fs::create_dir_all(&config.server.videos_dir).with_context(|| {
        format!("cannot create videos dir {}", config.server.videos_dir.display())
    })?;

    let store = Arc::new(TaskStore::new());
    let answers = Arc::new(OllamaAnswerService::new(&config.llm));
    let renderer = Arc::new(CommandRenderer::from_config(&config.render));
    let orchestrator = Arc::new(Orchestrator::new(
        store,
        answers,
        renderer,
        OrchestratorConfig::from(&config),
    ));

    let state = AppState::new(orchestrator);
    state.health.ensure_ready(config.llm.pull_missing_model).await;

    info!("Tutor Daemon ready");
    server::run(state, &config).await
}
