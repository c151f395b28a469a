//! Conversation Messages
//!
//! Message format shared by the task manager, the runner and providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System prompt/instructions
    System,
    /// User input
    User,
    /// Model (LLM) output
    Model,
    /// Tool result (injected as context)
    Tool,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Model => "model",
            Self::Tool => "tool",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Text content
    pub content: String,

    /// Agent that authored the message, for model and tool messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            author: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a model message
    pub fn model(content: impl Into<String>) -> Self {
        Self::new(Role::Model, content)
    }

    /// Create a tool result message
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }

    /// Attribute the message to an agent
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Estimate token count (rough approximation)
    pub fn estimate_tokens(&self) -> u32 {
        // ~4 characters per token
        u32::try_from(self.content.len() / 4).unwrap_or(u32::MAX).saturating_add(4)
    }
}

/// Conversation history kept on a session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,

    /// Maximum context length (in estimated tokens)
    #[serde(default = "default_max_context")]
    max_context_tokens: u32,
}

const fn default_max_context() -> u32 {
    8192
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            max_context_tokens: default_max_context(),
        }
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Estimate total tokens in conversation
    pub fn estimate_tokens(&self) -> u32 {
        self.messages.iter().map(Message::estimate_tokens).sum()
    }

    /// Drop the oldest messages until the history fits the token limit.
    /// The most recent message is always kept.
    pub fn truncate_to_fit(&mut self) {
        while self.estimate_tokens() > self.max_context_tokens && self.messages.len() > 1 {
            self.messages.remove(0);
        }
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
