//! # orchestrator-core
//!
//! Session management and agent-invocation runtime for the classroom
//! orchestrator.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        TaskManager                             │
//! │  ┌──────────────┐   ┌────────────────┐   ┌─────────────────┐  │
//! │  │ SessionStore │   │ AgentInvoker   │──▶│  EventFold      │  │
//! │  │ (get/create) │   │ (LlmRunner)    │   │ (final answer)  │  │
//! │  └──────────────┘   └───────┬────────┘   └─────────────────┘  │
//! │                             │                                  │
//! │                  AgentTree ─┼─ Tools ── LlmProvider            │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The routing decision itself is made by the model behind `LlmProvider`;
//! this crate only drives it and contains its failures.

pub mod agent;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod runner;
pub mod session;
pub mod task;
pub mod tool;

pub use agent::{AgentCard, AgentNode, AgentTree};
pub use error::{OrchestratorError, Result};
pub use event::{Content, Event, EventStream, Part};
pub use message::{Message, Role};
pub use provider::{GenerationOptions, LlmProvider};
pub use runner::{AgentInvoker, AgentTool, InvocationContext, LlmRunner, RunnerConfig};
pub use session::{MemorySessionStore, Session, SessionKey, SessionStore};
pub use task::{ProcessingResult, TaskContext, TaskManager, TaskManagerConfig, TaskStatus};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema, ToolStatus};
