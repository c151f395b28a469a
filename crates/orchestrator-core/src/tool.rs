//! Tool System
//!
//! Tools are the side-effecting capabilities an agent may call. A tool never
//! raises to the runner: failures come back as a `ToolResult` with
//! `status: error` so the model can react to them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::agent::AgentNode;
use crate::error::{OrchestratorError, Result};

/// Tool call request from the model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,

    /// Optional call ID for tracking
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: HashMap::new(),
            id: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    /// String argument, if present
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Integer argument; numeric strings are accepted too
    pub fn int_arg(&self, key: &str) -> Option<i64> {
        match self.arguments.get(key)? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Outcome status of a tool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Result from tool execution: `{status, message, ...extra}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID (if provided in request)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub status: ToolStatus,

    /// Human-readable outcome (success text or error description)
    pub message: String,

    /// Extra structured fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            status: ToolStatus::Success,
            message: message.into(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            status: ToolStatus::Error,
            message: error.into(),
            extra: serde_json::Map::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn required(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }
}

/// Tool definition schema (shown to the model)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Whether tool has side effects
    #[serde(default)]
    pub has_side_effects: bool,
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Agent wrapped by this tool, if it is an agent tool
    fn agent(&self) -> Option<&AgentNode> {
        None
    }

    /// Validate arguments before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(OrchestratorError::ToolValidation(format!(
                    "Missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Tools available to one agent
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool; a tool with the same name is replaced
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        if let Some(&idx) = self.by_name.get(&name) {
            self.tools[idx] = tool;
        } else {
            self.by_name.insert(name, self.tools.len());
            self.tools.push(tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| self.tools[idx].clone())
    }

    /// Validate and execute a tool call
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| OrchestratorError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    /// Tools in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Tool names in registration order
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.schema().name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// System prompt section describing the tools
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("To use a tool, respond with only a JSON block:\n\n");
        prompt.push_str("```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n");

        for tool in &self.tools {
            let schema = tool.schema();
            prompt.push_str(&format!("### {}\n{}\n", schema.name, schema.description));

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    prompt.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name, param.param_type, required, param.description
                    ));
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// DateTime tool - returns the current time
pub struct DateTimeTool;

#[async_trait]
impl Tool for DateTimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "datetime".into(),
            description: "Get the current date and time".into(),
            parameters: vec![ParameterSchema::optional(
                "format",
                "string",
                "Output format: 'iso', 'human', or 'unix'",
            )],
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let format = call.str_arg("format").unwrap_or("human");
        let now = chrono::Utc::now();

        let output = match format {
            "iso" => now.to_rfc3339(),
            "unix" => now.timestamp().to_string(),
            _ => now.format("%A, %B %d, %Y at %H:%M:%S UTC").to_string(),
        };

        Ok(ToolResult::success("datetime", output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo text back".into(),
                parameters: vec![ParameterSchema::required("text", "string", "Text to echo")],
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            Ok(ToolResult::success("echo", call.str_arg("text").unwrap_or_default()))
        }
    }

    #[test]
    fn test_tool_registry() {
        let mut registry = ToolRegistry::new();
        registry.register(DateTimeTool);
        registry.register(EchoTool);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["datetime", "echo"]);
        assert!(registry.get("unknown").is_none());
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let err = registry.execute(&ToolCall::new("echo")).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.execute(&ToolCall::new("nope")).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ToolNotFound(_)));
    }

    #[test]
    fn test_tool_call_parses_tool_alias() {
        let call: ToolCall =
            serde_json::from_str(r#"{"tool": "assign_mentor", "arguments": {"student_id": "7"}}"#)
                .unwrap();
        assert_eq!(call.name, "assign_mentor");
        assert_eq!(call.int_arg("student_id"), Some(7));
    }

    #[test]
    fn test_result_flattens_extra_fields() {
        let result = ToolResult::success("form_groups", "2 groups")
            .with_field("group_count", serde_json::json!(2));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "2 groups");
        assert_eq!(json["group_count"], 2);
    }
}
