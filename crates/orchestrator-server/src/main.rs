//! Classroom Orchestrator HTTP Server
//!
//! Axum server exposing the orchestration agent tree over a small REST API.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classroom::{
    build_orchestration_agent, CalendarClient, ClassroomDeps, GoogleCalendarClient,
    MemoryCalendar, Roster,
};
use orchestrator_core::{LlmProvider, LlmRunner, RunnerConfig, TaskManager, TaskManagerConfig};
use orchestrator_runtime::OllamaProvider;

use crate::config::ServerConfig;
use crate::handlers::{agent_card, health_check, run_handler};
use crate::state::AppState;

pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/agents", get(agent_card))
        .route("/run", post(run_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn load_roster(path: Option<&std::path::Path>, label: &str) -> anyhow::Result<Arc<Roster>> {
    match path {
        Some(path) => {
            let roster = Roster::load(path)
                .await
                .with_context(|| format!("loading {label} from {}", path.display()))?;
            Ok(Arc::new(roster))
        }
        None => {
            tracing::warn!("⚠ No {label} configured - buddy tools will find no students");
            Ok(Arc::new(Roster::from_students(Vec::new())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env();

    // Initialize LLM provider
    let ollama = OllamaProvider::from_env();
    let runner_config = RunnerConfig {
        generation: ollama.config().generation_options(),
        ..RunnerConfig::default()
    };
    tracing::info!(model = %runner_config.generation.model, "Using model");
    let provider: Arc<dyn LlmProvider> = Arc::new(ollama);
    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {}", provider.name()),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not available - tasks will fail until it is", provider.name());
            tracing::warn!("  Make sure Ollama is running: ollama serve");
        }
    }

    // Calendar backend
    let calendar: Arc<dyn CalendarClient> = match GoogleCalendarClient::from_env() {
        Some(client) => {
            tracing::info!(calendar_id = %client.config().calendar_id, "✓ Google Calendar configured");
            Arc::new(client)
        }
        None => {
            tracing::warn!("⚠ Google Calendar not configured - using an in-memory calendar");
            tracing::warn!("  Set GOOGLE_CALENDAR_CLIENT_ID, GOOGLE_CALENDAR_CLIENT_SECRET and GOOGLE_CALENDAR_REFRESH_TOKEN in .env");
            Arc::new(MemoryCalendar::new())
        }
    };

    // Rosters
    let group_roster = load_roster(config.roster_path.as_deref(), "ROSTER_PATH").await?;
    let mentor_roster = match config.mentor_roster_path.as_deref() {
        Some(path) => load_roster(Some(path), "MENTOR_ROSTER_PATH").await?,
        None => group_roster.clone(),
    };

    // Agent tree
    let deps = ClassroomDeps {
        provider: provider.clone(),
        calendar: calendar.clone(),
        group_roster,
        mentor_roster,
        offset: config.offset()?,
        runner: runner_config,
    };
    let root = build_orchestration_agent(&deps)?;
    let runner = LlmRunner::new(provider.clone(), root, deps.runner.clone())?;

    tracing::info!("Agent tree:");
    for agent in runner.tree().root().sub_agents() {
        tracing::info!("  • {} [{}]", agent.name(), agent.tools().names().join(", "));
    }

    let task_manager = TaskManager::new(Arc::new(runner), TaskManagerConfig::from_env());

    // Build application state
    let state = AppState {
        task_manager: Arc::new(task_manager),
        provider,
        calendar: calendar.name().to_string(),
    };

    // Start server
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 classroom orchestrator running on http://{}:{}", config.host, config.port);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health - Health check");
    tracing::info!("  GET  /agents - Agent tree");
    tracing::info!("  POST /run    - Process a message");

    axum::serve(listener, router(state)).await?;

    Ok(())
}
