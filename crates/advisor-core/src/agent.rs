//! Agentic tool loop over a hosted model.
//!
//! This module provides:
//! - `AgentInvoker`, the `invoke(prompt, tools) -> text` seam the handler calls
//! - `ProviderAgent`, which runs the loop against a `Provider`
//! - `run_once`, the loop itself: ask the model, execute requested tools,
//!   feed results back, stop at the first reply without tool calls

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::Error;
use crate::message::{Message, ToolCall, Usage};
use crate::provider::{CompletionRequest, Provider};
use crate::tool::ToolRegistry;

/// Configuration for an agent run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name used in logs.
    pub name: String,
    /// System prompt for the agent.
    pub system_prompt: Option<String>,
    /// Model override; falls back to the provider's default.
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Maximum agentic loop iterations.
    pub max_iterations: usize,
    /// Upper bound on a single tool execution.
    pub tool_timeout: Option<Duration>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: None,
            model: None,
            temperature: None,
            max_tokens: None,
            max_iterations: 10,
            tool_timeout: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }
}

/// Outcome of a completed agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// The model's final text reply.
    pub content: String,
    /// Number of model calls made.
    pub iterations: usize,
    /// Names of the tools the model called, in call order.
    pub tools_called: Vec<String>,
    pub usage: Usage,
}

/// The hosted agent collaborator.
///
/// Implementations send `prompt` to a reasoning model that may call any tool
/// in `tools` and return the model's final free-form reply.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, prompt: &str, tools: Arc<ToolRegistry>) -> Result<String, Error>;
}

/// `AgentInvoker` backed by a `Provider` and the tool loop in [`run_once`].
pub struct ProviderAgent {
    provider: Arc<dyn Provider>,
    config: AgentConfig,
}

impl ProviderAgent {
    pub fn new(provider: Arc<dyn Provider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

#[async_trait]
impl AgentInvoker for ProviderAgent {
    async fn invoke(&self, prompt: &str, tools: Arc<ToolRegistry>) -> Result<String, Error> {
        let run = run_once(
            self.provider.as_ref(),
            &tools,
            &self.config,
            vec![Message::user(prompt)],
        )
        .await?;

        debug!(
            agent = %self.config.name,
            iterations = run.iterations,
            tools_called = ?run.tools_called,
            prompt_tokens = run.usage.prompt_tokens,
            completion_tokens = run.usage.completion_tokens,
            "Agent run finished"
        );

        Ok(run.content)
    }
}

/// Run the tool loop until the model answers without requesting tools.
pub async fn run_once(
    provider: &dyn Provider,
    tools: &ToolRegistry,
    config: &AgentConfig,
    context: Vec<Message>,
) -> Result<AgentRun, Error> {
    debug!(
        agent = %config.name,
        provider = provider.name(),
        context_messages = context.len(),
        tools_available = tools.len(),
        "Agent run_once starting"
    );

    let mut messages = Vec::with_capacity(context.len() + 1);
    if let Some(system) = &config.system_prompt {
        messages.push(Message::system(system.as_str()));
    }
    messages.extend(context);

    let mut usage = Usage::default();
    let mut tools_called = Vec::new();

    for iteration in 0..config.max_iterations {
        debug!(
            agent = %config.name,
            iteration = iteration,
            message_count = messages.len(),
            "Agent iteration starting"
        );

        let mut request = CompletionRequest::new(messages.clone()).with_tools(tools.definitions());
        request.model = config.model.clone();
        request.temperature = config.temperature;
        request.max_tokens = config.max_tokens;

        let response = provider.complete(request).await?;
        usage.add(&response.usage);

        let tool_calls = response.message.tool_calls;
        if tool_calls.is_empty() {
            debug!(
                agent = %config.name,
                iterations = iteration + 1,
                response_len = response.message.content.len(),
                "Agent completed successfully"
            );
            return Ok(AgentRun {
                content: response.message.content,
                iterations: iteration + 1,
                tools_called,
                usage,
            });
        }

        debug!(
            agent = %config.name,
            tool_count = tool_calls.len(),
            "Agent executing tools"
        );

        messages.push(Message::assistant_with_tool_calls(
            response.message.content,
            tool_calls.clone(),
        ));

        for tool_call in &tool_calls {
            tools_called.push(tool_call.name.clone());
            messages.push(execute_tool(tools, tool_call, config.tool_timeout).await);
        }
    }

    Err(Error::Unknown(format!(
        "Agent {} exceeded max iterations ({})",
        config.name, config.max_iterations
    )))
}

/// Execute a single tool call and wrap the outcome as a tool-result message.
///
/// Tool failures are reported back to the model, never propagated.
async fn execute_tool(
    registry: &ToolRegistry,
    tool_call: &ToolCall,
    timeout: Option<Duration>,
) -> Message {
    let Some(tool) = registry.get(&tool_call.name) else {
        warn!(tool = %tool_call.name, "Model requested unknown tool");
        return Message::tool_error(
            &tool_call.id,
            format!("Error: Unknown tool '{}'", tool_call.name),
        );
    };

    debug!(tool = %tool_call.name, "Executing tool");

    let execution = tool.execute(tool_call.arguments.clone());
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, execution).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(format!(
                "tool '{}' did not finish within {:?}",
                tool_call.name, limit
            ))),
        },
        None => execution.await,
    };

    match result {
        Ok(output) if output.is_error => {
            Message::tool_error(&tool_call.id, format!("Error: {}", output.content))
        }
        Ok(output) => Message::tool_result(&tool_call.id, output.content),
        Err(e) => {
            warn!(tool = %tool_call.name, error = %e, "Tool execution failed");
            Message::tool_error(&tool_call.id, format!("Error executing tool: {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::testing::MockProvider;
    use crate::tool::{Tool, ToolDefinition, ToolOutput};
    use serde_json::{json, Value};

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercases the `text` argument"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.name(), self.description())
        }

        async fn execute(&self, arguments: Value) -> Result<ToolOutput, Error> {
            let text = arguments["text"]
                .as_str()
                .ok_or_else(|| Error::tool("upper", "missing text"))?;
            Ok(ToolOutput::success(text.to_uppercase()))
        }
    }

    struct SlowTool;

    #[async_trait]
    impl Tool for SlowTool {
        fn name(&self) -> &str {
            "slow"
        }

        fn description(&self) -> &str {
            "Never finishes in time"
        }

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(self.name(), self.description())
        }

        async fn execute(&self, _arguments: Value) -> Result<ToolOutput, Error> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(ToolOutput::success("late"))
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(Arc::new(UpperTool))
            .with_tool(Arc::new(SlowTool))
    }

    #[test]
    fn test_agent_config() {
        let config = AgentConfig::new("recommender")
            .with_system_prompt("You are an emergency management expert")
            .with_max_iterations(4)
            .with_model("claude-3-7-sonnet-20250219");

        assert_eq!(config.name, "recommender");
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.model.as_deref(), Some("claude-3-7-sonnet-20250219"));
    }

    #[tokio::test]
    async fn test_run_once_without_tools() {
        let provider = MockProvider::new();
        provider.queue_response("final answer");

        let config = AgentConfig::new("test").with_system_prompt("system");
        let run = run_once(&provider, &registry(), &config, vec![Message::user("hi")])
            .await
            .unwrap();

        assert_eq!(run.content, "final answer");
        assert_eq!(run.iterations, 1);
        assert!(run.tools_called.is_empty());

        let request = provider.last_request().unwrap();
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content, "hi");
        assert_eq!(request.tools.len(), 2);
    }

    #[tokio::test]
    async fn test_run_once_feeds_tool_results_back() {
        let provider = MockProvider::new();
        provider.queue_tool_calls(vec![ToolCall::new("tc_1", "upper", json!({"text": "evacuate"}))]);
        provider.queue_response("done");

        let run = run_once(&provider, &registry(), &AgentConfig::new("test"), vec![Message::user("go")])
            .await
            .unwrap();

        assert_eq!(run.content, "done");
        assert_eq!(run.iterations, 2);
        assert_eq!(run.tools_called, vec!["upper"]);

        let second = provider.last_request().unwrap();
        let tool_msg = second.messages.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("tc_1"));
        assert_eq!(tool_msg.content, "EVACUATE");
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_to_model() {
        let provider = MockProvider::new();
        provider.queue_tool_calls(vec![ToolCall::new("tc_1", "nope", json!({}))]);
        provider.queue_response("ok");

        run_once(&provider, &registry(), &AgentConfig::new("test"), vec![Message::user("go")])
            .await
            .unwrap();

        let tool_msg = provider.last_request().unwrap().messages.last().cloned().unwrap();
        assert!(tool_msg.is_error);
        assert!(tool_msg.content.contains("Unknown tool 'nope'"));
    }

    #[tokio::test]
    async fn test_tool_error_reported_to_model() {
        let provider = MockProvider::new();
        provider.queue_tool_calls(vec![ToolCall::new("tc_1", "upper", json!({}))]);
        provider.queue_response("ok");

        run_once(&provider, &registry(), &AgentConfig::new("test"), vec![Message::user("go")])
            .await
            .unwrap();

        let tool_msg = provider.last_request().unwrap().messages.last().cloned().unwrap();
        assert!(tool_msg.is_error);
        assert!(tool_msg.content.contains("missing text"));
    }

    #[tokio::test]
    async fn test_tool_timeout() {
        let provider = MockProvider::new();
        provider.queue_tool_calls(vec![ToolCall::new("tc_1", "slow", json!({}))]);
        provider.queue_response("ok");

        let config = AgentConfig::new("test").with_tool_timeout(Duration::from_millis(10));
        run_once(&provider, &registry(), &config, vec![Message::user("go")])
            .await
            .unwrap();

        let tool_msg = provider.last_request().unwrap().messages.last().cloned().unwrap();
        assert!(tool_msg.is_error);
        assert!(tool_msg.content.contains("did not finish"));
    }

    #[tokio::test]
    async fn test_max_iterations_exceeded() {
        let provider = MockProvider::new();
        for i in 0..3 {
            provider.queue_tool_calls(vec![ToolCall::new(
                format!("tc_{}", i),
                "upper",
                json!({"text": "again"}),
            )]);
        }

        let config = AgentConfig::new("looping").with_max_iterations(2);
        let err = run_once(&provider, &registry(), &config, vec![Message::user("go")])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("exceeded max iterations (2)"));
        assert_eq!(provider.request_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_agent_invoke() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_response("{\"priorityLevel\": \"high\"}");

        let agent = ProviderAgent::new(
            provider.clone(),
            AgentConfig::new("recommender").with_model("model-x"),
        );
        let text = agent.invoke("prompt", Arc::new(registry())).await.unwrap();

        assert_eq!(text, "{\"priorityLevel\": \"high\"}");
        assert_eq!(provider.last_request().unwrap().model.as_deref(), Some("model-x"));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let provider = MockProvider::new();
        let err = run_once(&provider, &registry(), &AgentConfig::new("test"), vec![Message::user("go")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unknown(_)));
    }
}
