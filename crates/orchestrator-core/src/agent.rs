//! Agent Tree
//!
//! Static, declarative description of the routing hierarchy. Each node has a
//! natural-language description (used by its parent to pick it), an
//! instruction, tools, and delegate sub-agents.
//!
//! ```text
//! orchestrationagent
//! ├── content_generator
//! ├── schedule_agent ── [agent tools]
//! └── buddy_bot ─────── [agent tools]
//! ```
//!
//! Trees are validated when built: names are unique across the whole tree
//! (including agents reachable through agent tools), so a node can never be
//! its own ancestor.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::error::{OrchestratorError, Result};
use crate::tool::{Tool, ToolRegistry};

/// A named unit of the routing tree
#[derive(Debug)]
pub struct AgentNode {
    name: String,
    description: String,
    instruction: String,
    model: Option<String>,
    tools: ToolRegistry,
    sub_agents: Vec<Arc<AgentNode>>,
}

impl AgentNode {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Model override for this agent
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn sub_agents(&self) -> &[Arc<AgentNode>] {
        &self.sub_agents
    }

    /// Direct sub-agent by name
    pub fn sub_agent(&self, name: &str) -> Option<&Arc<AgentNode>> {
        self.sub_agents.iter().find(|a| a.name == name)
    }

    /// Serializable summary of this subtree
    pub fn card(&self) -> AgentCard {
        AgentCard {
            name: self.name.clone(),
            description: self.description.clone(),
            tools: self.tools.names(),
            sub_agents: self.sub_agents.iter().map(|a| a.card()).collect(),
        }
    }

    /// Prompt section listing the sub-agents this agent may hand off to
    pub(crate) fn transfer_prompt_section(&self, parent: Option<&str>) -> String {
        if self.sub_agents.is_empty() && parent.is_none() {
            return String::new();
        }

        let mut prompt = String::from("## Delegation\n\n");
        prompt.push_str("To hand the request to another agent, respond with only:\n\n");
        prompt.push_str("```transfer\n{\"agent\": \"agent_name\"}\n```\n\n");
        for agent in &self.sub_agents {
            prompt.push_str(&format!("- `{}`: {}\n", agent.name, agent.description));
        }
        if let Some(parent) = parent {
            prompt.push_str(&format!(
                "- `{parent}`: your parent agent, if the request is outside your scope\n"
            ));
        }
        prompt
    }

    fn collect_names<'a>(&'a self, seen: &mut HashSet<&'a str>) -> Result<()> {
        if !seen.insert(self.name.as_str()) {
            return Err(OrchestratorError::Config(format!(
                "agent '{}' appears more than once in the tree",
                self.name
            )));
        }
        for tool in self.tools.iter() {
            if let Some(agent) = tool.agent() {
                agent.collect_names(seen)?;
            }
        }
        for agent in &self.sub_agents {
            agent.collect_names(seen)?;
        }
        Ok(())
    }
}

/// Serializable view of an agent subtree
#[derive(Clone, Debug, Serialize)]
pub struct AgentCard {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_agents: Vec<AgentCard>,
}

/// Builder for agent nodes
pub struct AgentBuilder {
    name: String,
    description: String,
    instruction: String,
    model: Option<String>,
    tools: ToolRegistry,
    sub_agents: Vec<Arc<AgentNode>>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: None,
            tools: ToolRegistry::new(),
            sub_agents: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tool_arc(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register_arc(tool);
        self
    }

    #[must_use]
    pub fn sub_agent(mut self, agent: Arc<AgentNode>) -> Self {
        self.sub_agents.push(agent);
        self
    }

    pub fn build(self) -> Result<AgentNode> {
        if self.name.trim().is_empty() {
            return Err(OrchestratorError::Config("agent name must not be empty".into()));
        }
        if self.name == "user" {
            return Err(OrchestratorError::Config("'user' is a reserved agent name".into()));
        }

        let node = AgentNode {
            name: self.name,
            description: self.description,
            instruction: self.instruction,
            model: self.model,
            tools: self.tools,
            sub_agents: self.sub_agents,
        };
        node.collect_names(&mut HashSet::new())?;
        Ok(node)
    }
}

/// Validated agent tree with name and parent lookups
#[derive(Debug, Clone)]
pub struct AgentTree {
    root: Arc<AgentNode>,
    agents: HashMap<String, Arc<AgentNode>>,
    parents: HashMap<String, String>,
}

impl AgentTree {
    pub fn new(root: Arc<AgentNode>) -> Result<Self> {
        root.collect_names(&mut HashSet::new())?;

        let mut agents = HashMap::new();
        let mut parents = HashMap::new();
        let mut stack = vec![root.clone()];
        while let Some(node) = stack.pop() {
            for child in &node.sub_agents {
                parents.insert(child.name.clone(), node.name.clone());
                stack.push(child.clone());
            }
            agents.insert(node.name.clone(), node);
        }

        Ok(Self { root, agents, parents })
    }

    pub fn root(&self) -> &Arc<AgentNode> {
        &self.root
    }

    /// Agent reachable through sub-agent links
    pub fn find(&self, name: &str) -> Option<&Arc<AgentNode>> {
        self.agents.get(name)
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.parents.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::DateTimeTool;

    fn leaf(name: &str) -> Arc<AgentNode> {
        Arc::new(
            AgentNode::builder(name)
                .description(format!("{name} description"))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_tree_lookup() {
        let schedule = Arc::new(
            AgentNode::builder("schedule_agent")
                .tool(DateTimeTool)
                .sub_agent(leaf("class_planner_agent"))
                .build()
                .unwrap(),
        );
        let root = Arc::new(
            AgentNode::builder("orchestrationagent")
                .sub_agent(schedule)
                .sub_agent(leaf("buddy_bot"))
                .build()
                .unwrap(),
        );

        let tree = AgentTree::new(root).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.parent_of("class_planner_agent"), Some("schedule_agent"));
        assert_eq!(tree.parent_of("orchestrationagent"), None);
        assert!(tree.find("buddy_bot").is_some());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let shared = leaf("helper");
        let result = AgentNode::builder("root")
            .sub_agent(shared.clone())
            .sub_agent(shared)
            .build();

        assert!(matches!(result, Err(OrchestratorError::Config(_))));
    }

    #[test]
    fn test_self_named_child_rejected() {
        let result = AgentNode::builder("root").sub_agent(leaf("root")).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_reserved_and_empty_names() {
        assert!(AgentNode::builder("").build().is_err());
        assert!(AgentNode::builder("user").build().is_err());
    }

    #[test]
    fn test_card() {
        let root = AgentNode::builder("root")
            .description("routes requests")
            .tool(DateTimeTool)
            .sub_agent(leaf("buddy_bot"))
            .build()
            .unwrap();

        let card = serde_json::to_value(root.card()).unwrap();
        assert_eq!(card["tools"][0], "datetime");
        assert_eq!(card["sub_agents"][0]["name"], "buddy_bot");
    }

    #[test]
    fn test_transfer_prompt_lists_children_and_parent() {
        let node = AgentNode::builder("schedule_agent")
            .sub_agent(leaf("class_planner_agent"))
            .build()
            .unwrap();
        let prompt = node.transfer_prompt_section(Some("orchestrationagent"));

        assert!(prompt.contains("`class_planner_agent`"));
        assert!(prompt.contains("`orchestrationagent`"));
        assert!(leaf("x").transfer_prompt_section(None).is_empty());
    }
}
