//! Agent Runner
//!
//! `AgentInvoker` is the boundary the task manager calls through: given a
//! session and a user message it returns a lazy stream of events. How the
//! request is routed is up to the implementation.
//!
//! `LlmRunner` is the implementation shipped here. It drives the agent tree
//! with an `LlmProvider` in a ReAct-style loop: every model turn either calls
//! a tool, hands the request to another agent, or answers.
//!
//! ```text
//! user ─► agent ─► provider.complete ─┬─ ```tool``` ─────► execute ─┐
//!           ▲                         ├─ ```transfer``` ─► switch ──┤
//!           └─────────────────────────┼─────────────────────────────┘
//!                                     └─ text ──► final event
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::agent::{AgentNode, AgentTree};
use crate::error::{OrchestratorError, Result};
use crate::event::{Content, Event, EventStream, Part};
use crate::message::{Message, Role};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::session::{Session, SessionKey, SessionState};
use crate::task::EventFold;
use crate::tool::{ParameterSchema, Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};

/// Everything an invocation needs to know about the caller
#[derive(Clone, Debug)]
pub struct InvocationContext {
    pub key: SessionKey,
    pub session: Arc<Session>,
}

/// Capability that runs one pass of the agent hierarchy
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// Root of the agent tree this invoker drives
    fn root_agent(&self) -> &Arc<AgentNode>;

    /// Start a pass; events are produced lazily as the stream is polled
    async fn invoke(&self, ctx: InvocationContext, message: Message) -> Result<EventStream>;
}

/// Runner configuration
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    /// Maximum model turns in a single pass
    pub max_iterations: usize,

    /// Generation options; an agent's own model overrides `model`
    pub generation: GenerationOptions,

    /// Upper bound for a single provider call
    pub turn_timeout: Option<Duration>,

    /// Buffered events between the runner task and the consumer
    pub channel_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            generation: GenerationOptions::default(),
            turn_timeout: Some(Duration::from_secs(120)),
            channel_capacity: 32,
        }
    }
}

/// LLM-driven implementation of `AgentInvoker`
pub struct LlmRunner {
    provider: Arc<dyn LlmProvider>,
    tree: Arc<AgentTree>,
    config: RunnerConfig,
}

impl LlmRunner {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        root: Arc<AgentNode>,
        config: RunnerConfig,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            tree: Arc::new(AgentTree::new(root)?),
            config,
        })
    }

    pub fn with_defaults(provider: Arc<dyn LlmProvider>, root: Arc<AgentNode>) -> Result<Self> {
        Self::new(provider, root, RunnerConfig::default())
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn tree(&self) -> &AgentTree {
        &self.tree
    }
}

#[async_trait]
impl AgentInvoker for LlmRunner {
    fn root_agent(&self) -> &Arc<AgentNode> {
        self.tree.root()
    }

    async fn invoke(&self, ctx: InvocationContext, message: Message) -> Result<EventStream> {
        let start = match ctx.session.active_agent().await {
            Some(name) => self
                .tree
                .find(&name)
                .cloned()
                .unwrap_or_else(|| self.tree.root().clone()),
            None => self.tree.root().clone(),
        };

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let pass = Pass {
            provider: self.provider.clone(),
            tree: self.tree.clone(),
            config: self.config.clone(),
            session: ctx.session,
            tx,
        };

        tracing::debug!(session = %ctx.key, agent = start.name(), "Starting pass");
        let handle = tokio::spawn(async move {
            if let Err(e) = pass.run(start, message).await {
                let _ = pass.tx.send(Err(e)).await;
            }
        });

        Ok(Box::pin(PassStream {
            inner: ReceiverStream::new(rx),
            handle,
            joined: false,
        }))
    }
}

/// Event stream backed by a runner task; dropping it aborts the task.
///
/// Once the channel closes the task is joined, so a pass that died by
/// panicking ends the stream with an error instead of silently.
struct PassStream {
    inner: ReceiverStream<Result<Event>>,
    handle: JoinHandle<()>,
    joined: bool,
}

impl Stream for PassStream {
    type Item = Result<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.joined {
            return Poll::Ready(None);
        }
        if let Some(item) = ready!(Pin::new(&mut self.inner).poll_next(cx)) {
            return Poll::Ready(Some(item));
        }

        let outcome = ready!(Pin::new(&mut self.handle).poll(cx));
        self.joined = true;
        match outcome {
            Ok(()) => Poll::Ready(None),
            Err(e) if e.is_panic() => {
                tracing::error!(error = %e, "Runner task panicked");
                Poll::Ready(Some(Err(OrchestratorError::upstream(
                    "Panic",
                    format!("Agent pass crashed: {e}"),
                ))))
            }
            Err(_) => Poll::Ready(Some(Err(OrchestratorError::Cancelled))),
        }
    }
}

impl Drop for PassStream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Consumer went away; stop the pass quietly
struct Abandoned;

/// State of one running pass
struct Pass {
    provider: Arc<dyn LlmProvider>,
    tree: Arc<AgentTree>,
    config: RunnerConfig,
    session: Arc<Session>,
    tx: mpsc::Sender<Result<Event>>,
}

impl Pass {
    async fn emit(&self, event: Event) -> std::result::Result<(), Abandoned> {
        self.tx.send(Ok(event)).await.map_err(|_| Abandoned)
    }

    async fn run(&self, start: Arc<AgentNode>, message: Message) -> Result<()> {
        let mut agent = start;
        let mut transcript = self.session.history().await;
        transcript.push(message.clone());

        for iteration in 1..=self.config.max_iterations {
            let content = self.complete(&agent, &transcript).await?;
            tracing::debug!(agent = agent.name(), iteration, "Model turn");

            if let Some(call) = parse_tool_call(&content) {
                let model_event = Event::new(agent.name(), Role::Model).with_content(Content::new(
                    Role::Model,
                    vec![Part::ToolCall { call: call.clone() }],
                ));
                if self.emit(model_event).await.is_err() {
                    return Ok(());
                }
                transcript.push(Message::model(&content).with_author(agent.name()));

                tracing::debug!(agent = agent.name(), tool = %call.name, "Executing tool");
                let result = execute_tool(agent.tools(), &call).await;
                transcript.push(Message::tool(format_tool_result(&result)).with_author(agent.name()));

                let tool_event = Event::new(agent.name(), Role::Tool).with_content(Content::new(
                    Role::Tool,
                    vec![Part::ToolResult { result }],
                ));
                if self.emit(tool_event).await.is_err() {
                    return Ok(());
                }
                continue;
            }

            if let Some(target) = parse_transfer(&content) {
                transcript.push(Message::model(&content).with_author(agent.name()));

                match self.resolve_transfer(&agent, &target) {
                    Some(next) => {
                        tracing::info!(from = agent.name(), to = next.name(), "Transferring");
                        let event = Event::new(agent.name(), Role::Model).with_transfer(next.name());
                        if self.emit(event).await.is_err() {
                            return Ok(());
                        }
                        agent = next;
                    }
                    None => {
                        tracing::warn!(agent = agent.name(), target = %target, "Unknown transfer target");
                        let notice = format!(
                            "[Transfer failed]\nAgent '{target}' is not reachable from '{}'.",
                            agent.name()
                        );
                        transcript.push(Message::tool(&notice).with_author(agent.name()));
                        let event = Event::new(agent.name(), Role::Tool)
                            .with_content(Content::text(Role::Tool, notice));
                        if self.emit(event).await.is_err() {
                            return Ok(());
                        }
                    }
                }
                continue;
            }

            let answer = content.trim().to_string();
            self.session
                .record([message, Message::model(&answer).with_author(agent.name())])
                .await;
            self.session.set_active_agent(agent.name()).await;
            let _ = self.emit(Event::final_text(agent.name(), answer)).await;
            return Ok(());
        }

        Err(OrchestratorError::MaxIterations(self.config.max_iterations))
    }

    /// One provider call for `agent` over the transcript
    async fn complete(&self, agent: &AgentNode, transcript: &[Message]) -> Result<String> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        messages.push(Message::system(build_system_prompt(
            agent,
            self.tree.parent_of(agent.name()),
        )));
        messages.extend_from_slice(transcript);

        let mut options = self.config.generation.clone();
        if let Some(model) = agent.model() {
            options.model = model.to_string();
        }

        let call = self.provider.complete(&messages, &options);
        let completion = match self.config.turn_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                OrchestratorError::Timeout(format!(
                    "{} did not answer within {}s",
                    self.provider.name(),
                    limit.as_secs()
                ))
            })??,
            None => call.await?,
        };

        Ok(completion.content)
    }

    fn resolve_transfer(&self, agent: &AgentNode, target: &str) -> Option<Arc<AgentNode>> {
        if let Some(child) = agent.sub_agent(target) {
            return Some(child.clone());
        }
        if self.tree.parent_of(agent.name()) == Some(target) {
            return self.tree.find(target).cloned();
        }
        None
    }
}

/// System prompt: instruction, tools, delegation targets
fn build_system_prompt(agent: &AgentNode, parent: Option<&str>) -> String {
    let mut prompt = format!("You are the agent `{}`.\n\n", agent.name());
    prompt.push_str(agent.instruction().trim());

    if !agent.tools().is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&agent.tools().generate_prompt_section());
    }

    let delegation = agent.transfer_prompt_section(parent);
    if !delegation.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&delegation);
    }

    prompt.push_str("\n\nOtherwise answer the user directly.");
    prompt
}

/// JSON body of a fenced block such as ```tool ... ```
fn fenced_block<'a>(content: &'a str, tag: &str) -> Option<&'a str> {
    let marker = format!("```{tag}");
    let start = content.find(&marker)?;
    let after = &content[start + marker.len()..];
    let end = after.find("```")?;
    Some(after[..end].trim())
}

/// Parse a tool call from a model reply
fn parse_tool_call(content: &str) -> Option<ToolCall> {
    let mut call = match fenced_block(content, "tool") {
        Some(json) => serde_json::from_str::<ToolCall>(json).ok(),
        None => parse_inline_tool_call(content),
    }?;

    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    Some(call)
}

/// Raw JSON object with a "tool" key anywhere in the reply
fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }

    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str::<ToolCall>(&content[start..=end]).ok()
}

#[derive(Deserialize)]
struct TransferRequest {
    #[serde(alias = "agent_name")]
    agent: String,
}

/// Parse a hand-off request from a model reply
fn parse_transfer(content: &str) -> Option<String> {
    let json = match fenced_block(content, "transfer") {
        Some(json) => json,
        None => {
            let trimmed = content.trim();
            if !(trimmed.starts_with('{') && trimmed.contains(r#""agent"#)) {
                return None;
            }
            trimmed
        }
    };

    serde_json::from_str::<TransferRequest>(json)
        .ok()
        .map(|t| t.agent.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Execute a tool call; every failure becomes a result the model can read
async fn execute_tool(tools: &ToolRegistry, call: &ToolCall) -> ToolResult {
    match tools.execute(call).await {
        Ok(result) => result.with_id(call.id.clone()),
        Err(e) => {
            tracing::warn!(tool = %call.name, error = %e, "Tool failed");
            ToolResult::failure(call.name.clone(), format!("Error: {e}")).with_id(call.id.clone())
        }
    }
}

/// Format tool result for the transcript
fn format_tool_result(result: &ToolResult) -> String {
    let body = if result.extra.is_empty() {
        result.message.clone()
    } else {
        format!(
            "{}\n{}",
            result.message,
            serde_json::Value::Object(result.extra.clone())
        )
    };

    if result.is_success() {
        format!("[Tool '{}' returned]\n{}", result.name, body)
    } else {
        format!("[Tool '{}' failed]\n{}", result.name, body)
    }
}

// ============================================================================
// Agent as a tool
// ============================================================================

/// Exposes an agent to its parent as a tool.
///
/// Calling it runs an isolated pass of the wrapped agent (fresh session, no
/// shared history) and returns the agent's final answer as the tool output.
pub struct AgentTool {
    agent: Arc<AgentNode>,
    runner: LlmRunner,
}

impl AgentTool {
    pub fn new(
        agent: Arc<AgentNode>,
        provider: Arc<dyn LlmProvider>,
        config: RunnerConfig,
    ) -> Result<Self> {
        let runner = LlmRunner::new(provider, agent.clone(), config)?;
        Ok(Self { agent, runner })
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.agent.name().to_string(),
            description: self.agent.description().to_string(),
            parameters: vec![ParameterSchema::required(
                "request",
                "string",
                "The request to pass to this agent, in plain language",
            )],
            has_side_effects: !self.agent.tools().is_empty(),
        }
    }

    fn agent(&self) -> Option<&AgentNode> {
        Some(&self.agent)
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let request = call
            .str_arg("request")
            .ok_or_else(|| OrchestratorError::ToolValidation("Missing request".into()))?;

        let key = SessionKey::new("agent_tool", self.agent.name(), SessionKey::generate_id());
        let session = Arc::new(Session::new(key.clone(), SessionState::new()));
        let ctx = InvocationContext { key, session };

        let mut stream = self.runner.invoke(ctx, Message::user(request)).await?;
        let mut fold = EventFold::default();
        while let Some(event) = stream.next().await {
            match event {
                Ok(event) => fold.push(event),
                Err(e) => {
                    return Ok(ToolResult::failure(self.agent.name(), e.to_string())
                        .with_field("error_kind", e.kind().into()));
                }
            }
        }

        match fold.answer() {
            Some(answer) => Ok(ToolResult::success(self.agent.name(), answer)),
            None => Ok(ToolResult::failure(self.agent.name(), "Agent produced no answer")),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::provider::Completion;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that replays scripted replies and records what it was sent
    pub(crate) struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String>>>,
        pub(crate) seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new(replies: Vec<&str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(|r| Ok(r.to_string())).collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn failing(error: OrchestratorError) -> Self {
            Self {
                replies: Mutex::new(VecDeque::from([Err(error)])),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<Completion> {
            self.seen.lock().unwrap().push(messages.to_vec());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("(script exhausted)".into()))?;
            Ok(Completion::text(&options.model, reply))
        }
    }

    struct RosterTool;

    #[async_trait]
    impl Tool for RosterTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "lookup_student".into(),
                description: "Look up a student".into(),
                parameters: vec![ParameterSchema::required("student_id", "integer", "Student ID")],
                has_side_effects: false,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            match call.int_arg("student_id") {
                Some(7) => Ok(ToolResult::success("lookup_student", "Asha, Grade 10")),
                _ => Ok(ToolResult::failure("lookup_student", "No such student")),
            }
        }
    }

    fn tree() -> Arc<AgentNode> {
        let buddy = Arc::new(
            AgentNode::builder("buddy_bot")
                .description("Assigns mentors")
                .instruction("Help with mentors.")
                .tool(RosterTool)
                .build()
                .unwrap(),
        );
        Arc::new(
            AgentNode::builder("orchestrationagent")
                .description("Routes requests")
                .instruction("Route the request.")
                .sub_agent(buddy)
                .build()
                .unwrap(),
        )
    }

    fn ctx() -> InvocationContext {
        let key = SessionKey::new("app", "user", "s1");
        InvocationContext {
            session: Arc::new(Session::new(key.clone(), SessionState::new())),
            key,
        }
    }

    async fn collect(stream: EventStream) -> Vec<Result<Event>> {
        stream.collect().await
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let content = "Let me check.\n```tool\n{\"tool\": \"lookup_student\", \"arguments\": {\"student_id\": 7}}\n```";
        let call = parse_tool_call(content).unwrap();
        assert_eq!(call.name, "lookup_student");
        assert!(call.id.is_some());
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let call = parse_tool_call(r#"{"tool": "datetime", "arguments": {}}"#).unwrap();
        assert_eq!(call.name, "datetime");
        assert!(parse_tool_call("Maths at 9, History at 2.").is_none());
    }

    #[test]
    fn test_parse_transfer() {
        assert_eq!(
            parse_transfer("```transfer\n{\"agent\": \"buddy_bot\"}\n```").as_deref(),
            Some("buddy_bot")
        );
        assert_eq!(parse_transfer(r#"{"agent_name": "schedule_agent"}"#).as_deref(), Some("schedule_agent"));
        assert!(parse_transfer("The agent will help you.").is_none());
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec!["Hello, teacher!"]));
        let runner = LlmRunner::with_defaults(provider, tree()).unwrap();
        let ctx = ctx();
        let session = ctx.session.clone();

        let events = collect(runner.invoke(ctx, Message::user("hi")).await.unwrap()).await;

        assert_eq!(events.len(), 1);
        let event = events[0].as_ref().unwrap();
        assert_eq!(event.final_model_text(), Some("Hello, teacher!"));
        assert_eq!(session.history().await.len(), 2);
        assert_eq!(session.active_agent().await.as_deref(), Some("orchestrationagent"));
    }

    #[tokio::test]
    async fn test_transfer_then_tool_then_answer() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "```transfer\n{\"agent\": \"buddy_bot\"}\n```",
            "```tool\n{\"tool\": \"lookup_student\", \"arguments\": {\"student_id\": 7}}\n```",
            "Asha is in Grade 10.",
        ]));
        let runner = LlmRunner::with_defaults(provider.clone(), tree()).unwrap();

        let events: Vec<Event> = collect(runner.invoke(ctx(), Message::user("Who is 7?")).await.unwrap())
            .await
            .into_iter()
            .map(|e| e.unwrap())
            .collect();

        assert_eq!(events.len(), 4);
        assert_eq!(events[0].actions.transfer_to_agent.as_deref(), Some("buddy_bot"));
        assert_eq!(events[1].author, "buddy_bot");
        assert_eq!(events[2].role, Role::Tool);
        match &events[2].content.as_ref().unwrap().parts[0] {
            Part::ToolResult { result } => assert!(result.is_success()),
            other => panic!("unexpected part {other:?}"),
        }
        assert_eq!(events[3].final_model_text(), Some("Asha is in Grade 10."));

        // The buddy_bot turn sees its own instruction and the tool result
        let seen = provider.seen.lock().unwrap();
        assert!(seen[1][0].content.contains("Help with mentors."));
        assert!(seen[2].iter().any(|m| m.content.contains("[Tool 'lookup_student' returned]")));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fed_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "```tool\n{\"tool\": \"upload_pdf\", \"arguments\": {}}\n```",
            "I cannot upload files.",
        ]));
        let runner = LlmRunner::with_defaults(provider, tree()).unwrap();

        let events = collect(runner.invoke(ctx(), Message::user("upload")).await.unwrap()).await;

        assert_eq!(events.len(), 3);
        let tool_event = events[1].as_ref().unwrap();
        match &tool_event.content.as_ref().unwrap().parts[0] {
            Part::ToolResult { result } => {
                assert!(!result.is_success());
                assert!(result.message.contains("Tool not found"));
            }
            other => panic!("unexpected part {other:?}"),
        }
        assert_eq!(
            events[2].as_ref().unwrap().final_model_text(),
            Some("I cannot upload files.")
        );
    }

    #[tokio::test]
    async fn test_unknown_transfer_target_is_fed_back() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "```transfer\n{\"agent\": \"evaluator_agent\"}\n```",
            "Evaluation is not available.",
        ]));
        let runner = LlmRunner::with_defaults(provider, tree()).unwrap();

        let events = collect(runner.invoke(ctx(), Message::user("grade this")).await.unwrap()).await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap().role, Role::Tool);
        assert!(events[1].as_ref().unwrap().final_model_text().is_some());
    }

    #[tokio::test]
    async fn test_max_iterations() {
        let replies = vec!["```tool\n{\"tool\": \"lookup_student\", \"arguments\": {\"student_id\": 1}}\n```"; 3];
        let provider = Arc::new(ScriptedProvider::new(replies));
        let config = RunnerConfig {
            max_iterations: 2,
            ..Default::default()
        };
        let runner = LlmRunner::new(provider, tree(), config).unwrap();

        let events = collect(runner.invoke(ctx(), Message::user("loop")).await.unwrap()).await;

        let last = events.last().unwrap();
        assert!(matches!(last, Err(OrchestratorError::MaxIterations(2))));
    }

    #[tokio::test]
    async fn test_provider_error_ends_stream() {
        let provider = Arc::new(ScriptedProvider::failing(OrchestratorError::ProviderUnavailable(
            "connection refused".into(),
        )));
        let runner = LlmRunner::with_defaults(provider, tree()).unwrap();

        let events = collect(runner.invoke(ctx(), Message::user("hi")).await.unwrap()).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(OrchestratorError::ProviderUnavailable(_))));
    }

    #[tokio::test]
    async fn test_next_pass_resumes_at_active_agent() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            "```transfer\n{\"agent\": \"buddy_bot\"}\n```",
            "Done.",
            "Still here.",
        ]));
        let runner = LlmRunner::with_defaults(provider, tree()).unwrap();
        let ctx = ctx();

        collect(runner.invoke(ctx.clone(), Message::user("mentor")).await.unwrap()).await;
        let events = collect(runner.invoke(ctx, Message::user("again")).await.unwrap()).await;

        assert_eq!(events[0].as_ref().unwrap().author, "buddy_bot");
    }

    #[tokio::test]
    async fn test_agent_tool_returns_final_answer() {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(ScriptedProvider::new(vec!["Plan: intro 10m, practice 40m."]));
        let planner = Arc::new(
            AgentNode::builder("class_planner_agent")
                .description("Creates class plans")
                .build()
                .unwrap(),
        );
        let tool = AgentTool::new(planner, provider, RunnerConfig::default()).unwrap();

        let result = tool
            .execute(&ToolCall::new("class_planner_agent").arg("request", "p-block, 1 hour"))
            .await
            .unwrap();

        assert!(result.is_success());
        assert_eq!(result.message, "Plan: intro 10m, practice 40m.");
        assert_eq!(tool.schema().parameters[0].name, "request");
    }

    #[test]
    fn test_agent_tool_counts_toward_unique_names() {
        let provider: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider::new(vec![]));
        let planner = Arc::new(AgentNode::builder("planner").build().unwrap());
        let tool = AgentTool::new(planner.clone(), provider, RunnerConfig::default()).unwrap();

        let result = AgentNode::builder("schedule_agent")
            .tool(tool)
            .sub_agent(planner)
            .build();

        assert!(result.is_err());
    }
}
