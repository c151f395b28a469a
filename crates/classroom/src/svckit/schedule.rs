//! Today's Events Tool
//!
//! Lists calendar events for the next 24 hours.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, FixedOffset, Utc};
use serde_json::json;

use orchestrator_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::calendar::CalendarClient;

const NAME: &str = "get_today_events";

/// Tool listing the day's timetable
pub struct TodayEventsTool {
    calendar: Arc<dyn CalendarClient>,
    offset: FixedOffset,
}

impl TodayEventsTool {
    pub fn new(calendar: Arc<dyn CalendarClient>, offset: FixedOffset) -> Self {
        Self { calendar, offset }
    }
}

#[async_trait]
impl Tool for TodayEventsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "List calendar events from now until the same time tomorrow.".into(),
            parameters: Vec::new(),
            has_side_effects: false,
        }
    }

    async fn execute(&self, _call: &ToolCall) -> CoreResult<ToolResult> {
        let now = Utc::now();
        let events = match self.calendar.events_between(now, now + Duration::days(1)).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(calendar = self.calendar.name(), error = %e, "Calendar lookup failed");
                return Ok(ToolResult::failure(NAME, e.to_string()));
            }
        };

        if events.is_empty() {
            return Ok(ToolResult::success(NAME, "No events scheduled for today.").with_field("events", json!([])));
        }

        let lines: Vec<String> = events.iter().map(|e| format!("- {}", e.describe(self.offset))).collect();
        let message = format!("Today's events:\n{}", lines.join("\n"));

        Ok(ToolResult::success(NAME, message).with_field("events", json!(events)))
    }
}
