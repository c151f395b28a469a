//! # orchestrator-runtime
//!
//! LLM providers for the classroom orchestrator.
//!
//! ## Providers
//!
//! - **Ollama** (default): local inference via Ollama
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orchestrator_runtime::OllamaProvider;
//!
//! let provider = Arc::new(OllamaProvider::from_env());
//! let runner = LlmRunner::with_defaults(provider, root_agent)?;
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

pub use orchestrator_core::{LlmProvider, OrchestratorError, Result};
