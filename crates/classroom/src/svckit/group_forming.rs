//! Group Forming Tool

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use orchestrator_core::{tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};

use crate::roster::{format_groups, Roster};

const NAME: &str = "form_groups";

/// Splits a subject/grade cohort into mixed-ability groups of three
pub struct GroupFormingTool {
    roster: Arc<Roster>,
}

impl GroupFormingTool {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self { roster }
    }
}

#[async_trait]
impl Tool for GroupFormingTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Form student groups of three for a subject and grade, mixing performance levels. \
                          Leftover students form a final smaller group."
                .into(),
            parameters: vec![
                ParameterSchema::required("subject", "string", "Subject name, e.g. 'Maths'"),
                ParameterSchema::required("grade", "integer", "Grade number, e.g. 10"),
            ],
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let Some(subject) = call.str_arg("subject").map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(ToolResult::failure(NAME, "Missing required key: subject"));
        };
        let Some(grade) = call.int_arg("grade").and_then(|g| u8::try_from(g).ok()) else {
            return Ok(ToolResult::failure(NAME, "grade must be a whole number between 0 and 255"));
        };

        let groups = self.roster.form_groups(subject, grade).await;
        if groups.is_empty() {
            return Ok(ToolResult::failure(
                NAME,
                format!("No students found for {subject} in grade {grade}."),
            ));
        }

        tracing::debug!(subject, grade, groups = groups.len(), "Groups formed");

        let names: Vec<Vec<&str>> = groups
            .iter()
            .map(|g| g.iter().map(|s| s.name.as_str()).collect())
            .collect();

        Ok(ToolResult::success(NAME, format_groups(&groups)).with_field("groups", json!(names)))
    }
}
