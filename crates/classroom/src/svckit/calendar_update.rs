//! Calendar Update Tools
//!
//! Add, move and delete timetable entries by name. Times such as "2 PM" are
//! placed on today's date (or `date`) in the school's UTC offset.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde_json::json;

use orchestrator_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::calendar::{parse_date, to_local_datetime, CalendarClient};
use crate::error::{ClassroomError, Result};

fn event_name_param() -> ParameterSchema {
    ParameterSchema::required("event_name", "string", "Title of the calendar event, e.g. 'History Class'")
}

fn time_params() -> Vec<ParameterSchema> {
    vec![
        ParameterSchema::required("start_time", "string", "Start time, e.g. '2 PM' or '14:00'"),
        ParameterSchema::required("end_time", "string", "End time, e.g. '3 PM' or '15:00'"),
        ParameterSchema::optional("date", "string", "Date as YYYY-MM-DD; defaults to today"),
    ]
}

fn required<'a>(call: &'a ToolCall, key: &str) -> std::result::Result<&'a str, String> {
    call.str_arg(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Missing required key: {key}"))
}

/// Resolve `start_time`/`end_time`/`date` into concrete times
fn resolve_times(
    call: &ToolCall,
    offset: FixedOffset,
) -> std::result::Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), String> {
    let start = required(call, "start_time")?;
    let end = required(call, "end_time")?;

    let convert = || -> Result<_> {
        let date = parse_date(call.str_arg("date"))?;
        let start = to_local_datetime(start, date, offset)?;
        let end = to_local_datetime(end, date, offset)?;
        if end <= start {
            return Err(ClassroomError::InvalidTime(format!("{end} is not after {start}")));
        }
        Ok((start, end))
    };

    convert().map_err(|e| e.to_string())
}

/// Creates a calendar event
pub struct AddEventTool {
    calendar: Arc<dyn CalendarClient>,
    offset: FixedOffset,
}

impl AddEventTool {
    pub fn new(calendar: Arc<dyn CalendarClient>, offset: FixedOffset) -> Self {
        Self { calendar, offset }
    }
}

#[async_trait]
impl Tool for AddEventTool {
    fn schema(&self) -> ToolSchema {
        let mut parameters = vec![event_name_param()];
        parameters.extend(time_params());

        ToolSchema {
            name: "add_calendar_event".into(),
            description: "Add an event to the class calendar.".into(),
            parameters,
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        const NAME: &str = "add_calendar_event";

        let (name, (start, end)) = match required(call, "event_name")
            .and_then(|name| Ok((name, resolve_times(call, self.offset)?)))
        {
            Ok(parsed) => parsed,
            Err(message) => return Ok(ToolResult::failure(NAME, message)),
        };

        match self.calendar.insert(name, start, end).await {
            Ok(event) => {
                tracing::info!(event_id = %event.id, summary = %event.summary, "Calendar event added");
                Ok(ToolResult::success(
                    NAME,
                    format!(
                        "Event '{name}' added from {} to {}.",
                        start.format("%H:%M"),
                        end.format("%H:%M")
                    ),
                )
                .with_field("event", json!(event)))
            }
            Err(e) => Ok(ToolResult::failure(NAME, format!("Failed to add event: {e}"))),
        }
    }
}

/// Moves an existing event, found by name, to new times
pub struct UpdateEventTool {
    calendar: Arc<dyn CalendarClient>,
    offset: FixedOffset,
}

impl UpdateEventTool {
    pub fn new(calendar: Arc<dyn CalendarClient>, offset: FixedOffset) -> Self {
        Self { calendar, offset }
    }
}

#[async_trait]
impl Tool for UpdateEventTool {
    fn schema(&self) -> ToolSchema {
        let mut parameters = vec![event_name_param()];
        parameters.extend(time_params());

        ToolSchema {
            name: "update_calendar_event".into(),
            description: "Change the start and end time of an existing event, matched by name.".into(),
            parameters,
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        const NAME: &str = "update_calendar_event";

        let (name, (start, end)) = match required(call, "event_name")
            .and_then(|name| Ok((name, resolve_times(call, self.offset)?)))
        {
            Ok(parsed) => parsed,
            Err(message) => return Ok(ToolResult::failure(NAME, message)),
        };

        let existing = match self.calendar.find_by_summary(name).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return Ok(ToolResult::failure(
                    NAME,
                    format!("No matching event found to update with name '{name}'."),
                ));
            }
            Err(e) => return Ok(ToolResult::failure(NAME, e.to_string())),
        };

        match self.calendar.patch_times(&existing.id, start, end).await {
            Ok(event) => {
                tracing::info!(event_id = %event.id, "Calendar event moved");
                Ok(ToolResult::success(NAME, format!("Event '{name}' updated successfully."))
                    .with_field("event", json!(event)))
            }
            Err(e) => Ok(ToolResult::failure(NAME, format!("Failed to update event: {e}"))),
        }
    }
}

/// Deletes an event matched by name
pub struct DeleteEventTool {
    calendar: Arc<dyn CalendarClient>,
}

impl DeleteEventTool {
    pub fn new(calendar: Arc<dyn CalendarClient>) -> Self {
        Self { calendar }
    }
}

#[async_trait]
impl Tool for DeleteEventTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "delete_calendar_event".into(),
            description: "Delete an event from the class calendar, matched by name.".into(),
            parameters: vec![event_name_param()],
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        const NAME: &str = "delete_calendar_event";

        let name = match required(call, "event_name") {
            Ok(name) => name,
            Err(message) => return Ok(ToolResult::failure(NAME, message)),
        };

        let existing = match self.calendar.find_by_summary(name).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return Ok(ToolResult::failure(
                    NAME,
                    format!("No matching event found to delete with name '{name}'."),
                ));
            }
            Err(e) => return Ok(ToolResult::failure(NAME, e.to_string())),
        };

        match self.calendar.delete(&existing.id).await {
            Ok(()) => {
                tracing::info!(event_id = %existing.id, "Calendar event deleted");
                Ok(ToolResult::success(NAME, format!("Event '{name}' deleted successfully.")))
            }
            Err(e) => Ok(ToolResult::failure(NAME, format!("Failed to delete event: {e}"))),
        }
    }
}
