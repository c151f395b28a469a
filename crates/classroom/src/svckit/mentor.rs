//! Mentor Assignment Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use orchestrator_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::error::ClassroomError;
use crate::roster::Roster;

const NAME: &str = "assign_mentor";

/// Pairs a student with a mentor from a stronger performance band
pub struct MentorAssignTool {
    roster: Arc<Roster>,
}

impl MentorAssignTool {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }
}

#[async_trait]
impl Tool for MentorAssignTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Assign a mentor to a student by ID. Average students get a good mentor, \
                          bad students get an average or good mentor; good students need none."
                .into(),
            parameters: vec![ParameterSchema::required("student_id", "integer", "Student ID number")],
            has_side_effects: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let Some(student_id) = call.int_arg("student_id").and_then(|id| u32::try_from(id).ok()) else {
            return Ok(ToolResult::failure(NAME, "student_id must be a positive whole number"));
        };

        match self.roster.assign_mentor(student_id).await {
            Ok(outcome) => Ok(ToolResult::success(NAME, outcome.to_string())
                .with_field("assigned", json!(outcome.is_assigned()))),
            Err(e @ ClassroomError::StudentNotFound(_)) => Ok(ToolResult::failure(NAME, format!("{e}."))),
            Err(e) => {
                tracing::error!(student_id, error = %e, "Mentor assignment failed");
                Ok(ToolResult::failure(NAME, format!("Error executing logic: {e}")))
            }
        }
    }
}
