//! HTTP server for tutord

use crate::config::{Config, ServerConfig};
use crate::health::HealthReporter;
use crate::orchestrator::Orchestrator;
use crate::routes;
use crate::status::StatusEndpoint;
use crate::store;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tutor_shared::VIDEOS_ROUTE;

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub status: StatusEndpoint,
    pub health: HealthReporter,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let store = Arc::clone(orchestrator.store());
        Self {
            status: StatusEndpoint::new(Arc::clone(&store)),
            health: HealthReporter::new(Arc::clone(orchestrator.answers()), store),
            orchestrator,
        }
    }
}

/// Build the full router: API, rendered videos, optional front end
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let mut app = Router::new()
        .merge(routes::task_routes())
        .merge(routes::health_routes())
        .merge(routes::model_routes())
        .with_state(state)
        .nest_service(VIDEOS_ROUTE, ServeDir::new(&config.videos_dir));

    if let Some(static_dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C, then drain in-flight renders
pub async fn run(state: AppState, config: &Config) -> Result<()> {
    let state = Arc::new(state);
    let orchestrator = Arc::clone(&state.orchestrator);

    let sweeper = store::spawn_sweeper(
        Arc::clone(orchestrator.store()),
        config.retention(),
        config.sweep_interval(),
    );

    let app = router(state, &config.server);
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    sweeper.abort();
    orchestrator.shutdown(config.shutdown_grace()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
