//! Application State

use std::sync::Arc;

use orchestrator_core::{LlmProvider, TaskManager};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Session-aware entry point to the agent tree
    pub task_manager: Arc<TaskManager>,

    /// LLM provider, for health reporting
    pub provider: Arc<dyn LlmProvider>,

    /// Calendar backend name ("google" or "memory")
    pub calendar: String,
}
