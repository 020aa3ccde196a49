// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::analysis_service::AnalysisService;
use crate::application::commentary::CommentaryService;
use crate::application::model_registry::ModelRegistry;
use crate::application::predictor::LapTimePredictor;
use crate::application::season_service::SeasonService;
use crate::application::session_cache::CachedSessionSource;
use crate::application::session_repository::SessionDataSource;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::gemini_client::GeminiClient;
use crate::infrastructure::openf1_repository::OpenF1Repository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    driver_analysis, health_check, list_circuits, list_drivers, predict_lap_time, pundit_verdict,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pitwall_insights=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create repository (infrastructure layer), memoized per session
    let openf1 = Arc::new(OpenF1Repository::new(config.openf1.base_url.clone()));
    let sessions: Arc<dyn SessionDataSource> = Arc::new(CachedSessionSource::new(openf1));

    let registry = Arc::new(ModelRegistry::new(
        PathBuf::from(&config.models.directory),
        config.models.extension.clone(),
        config.circuits.event_names(),
    ));

    let commentary: Option<Arc<dyn CommentaryService>> = match config.commentary.api_key.clone() {
        Some(key) if !key.trim().is_empty() => Some(Arc::new(GeminiClient::new(
            config.commentary.base_url.clone(),
            config.commentary.model.clone(),
            key,
        ))),
        _ => {
            tracing::warn!("No commentary API key configured, pundit verdicts are disabled");
            None
        }
    };

    // Create services (application layer)
    let state = Arc::new(AppState {
        season_service: SeasonService::new(sessions.clone()),
        analysis_service: AnalysisService::new(sessions.clone()),
        predictor: LapTimePredictor::new(sessions, registry),
        commentary,
    });

    // Build router (presentation layer)
    // Compression is handled in the response builders, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/seasons/:year/circuits", get(list_circuits))
        .route("/seasons/:year/drivers", get(list_drivers))
        .route("/analysis", get(driver_analysis))
        .route("/predictions", post(predict_lap_time))
        .route("/commentary", post(pundit_verdict))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind_address))?;
    tracing::info!("Starting pitwall-insights service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
