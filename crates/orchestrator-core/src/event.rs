//! Pass Events
//!
//! One processing pass produces an ordered, finite stream of events. The
//! task manager folds that stream into a single answer.

use std::pin::Pin;

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::message::Role;
use crate::tool::{ToolCall, ToolResult};

/// One piece of event content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Part {
    Text { text: String },
    ToolCall { call: ToolCall },
    ToolResult { result: ToolResult },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text of a text part
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Content carried by an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self { role, parts }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self::new(role, vec![Part::text(text)])
    }
}

/// Side effects an event requests from the runner
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_to_agent: Option<String>,
}

/// A single record emitted during a processing pass
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,

    /// Agent that produced the event (`user` for the inbound message)
    pub author: String,

    /// Producing role
    pub role: Role,

    /// Marks the terminal event of a model turn
    #[serde(default)]
    pub is_final: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(default, skip_serializing_if = "is_default_actions")]
    pub actions: EventActions,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn is_default_actions(actions: &EventActions) -> bool {
    actions.transfer_to_agent.is_none()
}

impl Event {
    pub fn new(author: impl Into<String>, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author: author.into(),
            role,
            is_final: false,
            content: None,
            actions: EventActions::default(),
            timestamp: Utc::now(),
        }
    }

    /// Terminal model answer
    pub fn final_text(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(author, Role::Model)
            .with_content(Content::text(Role::Model, text))
            .finalized()
    }

    #[must_use]
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    #[must_use]
    pub fn with_transfer(mut self, agent: impl Into<String>) -> Self {
        self.actions.transfer_to_agent = Some(agent.into());
        self
    }

    #[must_use]
    pub const fn finalized(mut self) -> Self {
        self.is_final = true;
        self
    }

    /// First content part as text, if there is one
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .as_ref()
            .and_then(|c| c.parts.first())
            .and_then(Part::as_text)
    }

    /// Answer text when this is a terminal, model-authored event with
    /// non-empty leading text
    pub fn final_model_text(&self) -> Option<&str> {
        if !self.is_final || self.role != Role::Model {
            return None;
        }
        let content = self.content.as_ref()?;
        if content.role != Role::Model {
            return None;
        }
        self.first_text().filter(|t| !t.is_empty())
    }
}

/// Lazy, finite, non-restartable event sequence of one pass
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Event>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_model_text() {
        let event = Event::final_text("schedule_agent", "You have Maths at 9.");
        assert_eq!(event.final_model_text(), Some("You have Maths at 9."));
    }

    #[test]
    fn test_non_final_has_no_answer() {
        let event = Event::new("orchestrationagent", Role::Model)
            .with_content(Content::text(Role::Model, "thinking"));
        assert!(event.final_model_text().is_none());
    }

    #[test]
    fn test_final_tool_event_has_no_answer() {
        let event = Event::new("buddy_bot", Role::Tool)
            .with_content(Content::text(Role::Tool, "done"))
            .finalized();
        assert!(event.final_model_text().is_none());
    }

    #[test]
    fn test_empty_text_is_ignored() {
        let event = Event::final_text("root", "");
        assert!(event.final_model_text().is_none());
    }

    #[test]
    fn test_serialization_skips_empty_actions() {
        let json = serde_json::to_value(Event::final_text("root", "hi")).unwrap();
        assert!(json.get("actions").is_none());
        assert_eq!(json["content"]["parts"][0]["type"], "text");
    }
}
