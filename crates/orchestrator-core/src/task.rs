//! Task Manager
//!
//! Entry point for one user request: resolve the session, run one pass of
//! the agent tree, fold its events into a `ProcessingResult`. Every call
//! returns a result; failures are reported as `status: "error"` values and
//! never propagate to the caller.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::{OrchestratorError, Result};
use crate::event::Event;
use crate::message::Message;
use crate::runner::{AgentInvoker, InvocationContext};
use crate::session::{MemorySessionStore, SessionKey, SessionState, SessionStore};

/// Answer used when a pass ends without a terminal model event
pub const NO_RESPONSE: &str = "(No response generated)";

/// Caller-supplied context for a task
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TaskContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl TaskContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }
}

/// Outcome status of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Success,
    Error,
}

/// Diagnostics attached to a result
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResultData {
    /// Trailing events of the pass, oldest first
    #[serde(default, alias = "trailing_events", skip_serializing_if = "Vec::is_empty")]
    pub raw_events: Vec<Event>,

    /// Failure category, on error results
    #[serde(default, alias = "error_type", skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

/// Final, immutable result of one `process_task` call
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub message: String,
    pub status: TaskStatus,
    pub data: ResultData,
    pub session_id: String,
}

impl ProcessingResult {
    fn success(message: String, raw_events: Vec<Event>, session_id: String) -> Self {
        Self {
            message,
            status: TaskStatus::Success,
            data: ResultData {
                raw_events,
                error_kind: None,
            },
            session_id,
        }
    }

    fn failure(error: &OrchestratorError, session_id: String) -> Self {
        Self {
            message: format!("Error processing request: {error}"),
            status: TaskStatus::Error,
            data: ResultData {
                raw_events: Vec::new(),
                error_kind: Some(error.kind().to_string()),
            },
            session_id,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }
}

/// Folds a pass's events into an answer plus a bounded trailing window
#[derive(Debug)]
pub struct EventFold {
    answer: Option<String>,
    trailing: VecDeque<Event>,
    keep: usize,
    total: usize,
}

impl Default for EventFold {
    fn default() -> Self {
        Self::new(3)
    }
}

impl EventFold {
    /// Fold keeping at most `keep` trailing events
    pub fn new(keep: usize) -> Self {
        Self {
            answer: None,
            trailing: VecDeque::with_capacity(keep),
            keep,
            total: 0,
        }
    }

    /// Consume the next event, in emission order
    pub fn push(&mut self, event: Event) {
        self.total += 1;
        if let Some(text) = event.final_model_text() {
            tracing::debug!(author = %event.author, "Final response");
            self.answer = Some(text.to_string());
        }
        if self.keep == 0 {
            return;
        }
        if self.trailing.len() == self.keep {
            self.trailing.pop_front();
        }
        self.trailing.push_back(event);
    }

    /// Text of the last terminal model event seen so far
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Number of events consumed
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Answer (or placeholder) and the trailing events
    pub fn finish(self, placeholder: &str) -> (String, Vec<Event>) {
        let answer = self.answer.unwrap_or_else(|| placeholder.to_string());
        (answer, self.trailing.into())
    }
}

/// Task manager configuration
#[derive(Clone, Debug)]
pub struct TaskManagerConfig {
    /// Application name, part of every session identity
    pub app_name: String,

    /// User used when the context has none
    pub default_user_id: String,

    /// Trailing events returned with each result
    pub trailing_events: usize,

    /// Answer when the pass produced no terminal model event
    pub no_response_text: String,
}

impl Default for TaskManagerConfig {
    fn default() -> Self {
        Self {
            app_name: "orchestration_root_app".into(),
            default_user_id: "default_a2a_user".into(),
            trailing_events: 3,
            no_response_text: NO_RESPONSE.into(),
        }
    }
}

impl TaskManagerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            app_name: std::env::var("APP_NAME").unwrap_or(defaults.app_name),
            default_user_id: std::env::var("DEFAULT_USER_ID").unwrap_or(defaults.default_user_id),
            ..defaults
        }
    }
}

/// Owns the session store and drives the root agent
pub struct TaskManager {
    invoker: Arc<dyn AgentInvoker>,
    sessions: Arc<dyn SessionStore>,
    config: TaskManagerConfig,
}

impl TaskManager {
    pub fn new(invoker: Arc<dyn AgentInvoker>, config: TaskManagerConfig) -> Self {
        Self::with_store(invoker, Arc::new(MemorySessionStore::new()), config)
    }

    pub fn with_store(
        invoker: Arc<dyn AgentInvoker>,
        sessions: Arc<dyn SessionStore>,
        config: TaskManagerConfig,
    ) -> Self {
        tracing::info!(
            agent = invoker.root_agent().name(),
            app = %config.app_name,
            "Initializing task manager"
        );
        Self {
            invoker,
            sessions,
            config,
        }
    }

    pub fn config(&self) -> &TaskManagerConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn invoker(&self) -> &Arc<dyn AgentInvoker> {
        &self.invoker
    }

    /// Process one message through the root agent.
    ///
    /// Dropping the returned future abandons the pass; the runner stops at
    /// its next event.
    pub async fn process_task(
        &self,
        message: &str,
        context: &TaskContext,
        session_id: Option<&str>,
    ) -> ProcessingResult {
        self.process_task_with_cancel(message, context, session_id, CancellationToken::new())
            .await
    }

    /// `process_task` that also stops when `cancel` fires
    pub async fn process_task_with_cancel(
        &self,
        message: &str,
        context: &TaskContext,
        session_id: Option<&str>,
        cancel: CancellationToken,
    ) -> ProcessingResult {
        let user_id = context
            .user_id
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.config.default_user_id);

        let session_id = match session_id.filter(|s| !s.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = SessionKey::generate_id();
                tracing::info!(session_id = %id, "Generated new session_id");
                id
            }
        };

        let key = SessionKey::new(&self.config.app_name, user_id, &session_id);

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(OrchestratorError::Cancelled),
            outcome = self.run(&key, message) => outcome,
        };

        match outcome {
            Ok((answer, raw_events)) => {
                tracing::info!(session_id = %session_id, "Task completed");
                ProcessingResult::success(answer, raw_events, session_id)
            }
            Err(e) => {
                tracing::error!(session_id = %session_id, kind = e.kind(), error = %e, "Error during task processing");
                ProcessingResult::failure(&e, session_id)
            }
        }
    }

    async fn run(&self, key: &SessionKey, message: &str) -> Result<(String, Vec<Event>)> {
        let session = match self.sessions.get(key).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                let session = self
                    .sessions
                    .create(key, SessionState::new())
                    .await
                    .map_err(as_session_error)?;
                tracing::info!(session = %key, "Created new session");
                session
            }
            Err(e) => return Err(as_session_error(e)),
        };

        let _turn = session.begin_turn().await;

        let ctx = InvocationContext {
            key: key.clone(),
            session,
        };
        let mut stream = self
            .invoker
            .invoke(ctx, Message::user(message))
            .await
            .map_err(as_upstream_error)?;

        let mut fold = EventFold::new(self.config.trailing_events);
        while let Some(event) = stream.next().await {
            fold.push(event.map_err(as_upstream_error)?);
        }

        tracing::debug!(session = %key, events = fold.total(), "Pass finished");
        Ok(fold.finish(&self.config.no_response_text))
    }
}

fn as_session_error(e: OrchestratorError) -> OrchestratorError {
    match e {
        OrchestratorError::SessionResolution(_) => e,
        other => OrchestratorError::SessionResolution(other.to_string()),
    }
}

/// Keep the underlying category while marking the failure as upstream
fn as_upstream_error(e: OrchestratorError) -> OrchestratorError {
    match e {
        OrchestratorError::UpstreamInvocation { .. } | OrchestratorError::Cancelled => e,
        other => OrchestratorError::upstream(other.kind(), other.to_string()),
    }
}
