//! Error Types

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Orchestrator error types
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// Session could not be fetched or created
    #[error("Session resolution failed: {0}")]
    SessionResolution(String),

    /// The agent invocation (or its event stream) failed
    #[error("{message}")]
    UpstreamInvocation {
        /// Category of the underlying failure
        kind: String,
        message: String,
    },

    /// LLM provider error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unavailable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Upstream call did not finish in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Tool not found on the agent
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool validation failed
    #[error("Tool validation error: {0}")]
    ToolValidation(String),

    /// Tool execution failed
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Transfer target is not reachable from the current agent
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Maximum model turns reached in a single pass
    #[error("Maximum iterations ({0}) reached")]
    MaxIterations(usize),

    /// Processing was abandoned by the caller
    #[error("Processing cancelled")]
    Cancelled,

    /// Parse error (e.g., tool call parsing)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration error (including invalid agent trees)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl OrchestratorError {
    /// Wrap any failure as an upstream invocation error, keeping its category
    pub fn upstream(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamInvocation {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Stable category name, reported as `error_kind` in processing results
    pub fn kind(&self) -> &str {
        match self {
            Self::SessionResolution(_) => "SessionResolutionError",
            Self::UpstreamInvocation { kind, .. } => kind,
            Self::Provider(_) => "ProviderError",
            Self::ProviderUnavailable(_) => "ProviderUnavailable",
            Self::Timeout(_) => "TimeoutError",
            Self::ToolNotFound(_) => "ToolNotFound",
            Self::ToolValidation(_) => "ToolValidationError",
            Self::ToolExecution(_) => "ToolExecutionError",
            Self::AgentNotFound(_) => "AgentNotFound",
            Self::MaxIterations(_) => "MaxIterations",
            Self::Cancelled => "Cancelled",
            Self::Parse(_) => "ParseError",
            Self::Config(_) => "ConfigError",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Other(_) => "UpstreamInvocationError",
        }
    }

    /// Check if error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable(_) | Self::Timeout(_) | Self::Io(_)
        )
    }
}

impl From<anyhow::Error> for OrchestratorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
