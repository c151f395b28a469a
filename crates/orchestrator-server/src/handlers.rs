//! HTTP Handlers

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use orchestrator_core::{AgentCard, ProcessingResult, TaskContext};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_provider: String,
    pub llm_connected: bool,
    pub calendar: String,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub message: String,
    #[serde(default)]
    pub context: TaskContext,
    #[serde(default)]
    pub session_id: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        llm_provider: state.provider.name().to_string(),
        llm_connected,
        calendar: state.calendar.clone(),
    })
}

/// Agent tree served at `/agents`
pub async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(state.task_manager.invoker().root_agent().card())
}

/// Run one message through the orchestrator.
///
/// Failures are reported inside the result, so this always answers 200.
pub async fn run_handler(
    State(state): State<AppState>,
    Json(payload): Json<RunRequest>,
) -> Json<ProcessingResult> {
    tracing::debug!(session_id = ?payload.session_id, "Run request");

    let result = state
        .task_manager
        .process_task(&payload.message, &payload.context, payload.session_id.as_deref())
        .await;

    Json(result)
}
