//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::agent::AgentInvoker;
use crate::error::Error;
use crate::message::{Message, ToolCall, Usage};
use crate::provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
use crate::tool::ToolRegistry;

/// A mock provider that returns pre-configured responses.
pub struct MockProvider {
    responses: Mutex<Vec<Result<CompletionResponse, Error>>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
    pub name: String,
    pub default_model: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
            name: "mock".to_string(),
            default_model: None,
        }
    }

    /// Queue a plain text reply.
    /// Responses are returned in FIFO order (first queued = first returned).
    pub fn queue_response(&self, content: &str) {
        self.queue_raw_response(CompletionResponse {
            message: Message::assistant(content),
            usage: Usage::new(0, 0),
            model: "mock-model".to_string(),
            finish_reason: FinishReason::Stop,
        });
    }

    /// Queue a reply that requests tool calls.
    pub fn queue_tool_calls(&self, tool_calls: Vec<ToolCall>) {
        self.queue_raw_response(CompletionResponse {
            message: Message::assistant_with_tool_calls("", tool_calls),
            usage: Usage::new(0, 0),
            model: "mock-model".to_string(),
            finish_reason: FinishReason::ToolCalls,
        });
    }

    /// Queue a raw CompletionResponse.
    pub fn queue_raw_response(&self, response: CompletionResponse) {
        self.responses.lock().unwrap().insert(0, Ok(response));
    }

    /// Queue a failure for the next complete() call.
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    /// Get the number of captured requests.
    pub fn request_count(&self) -> usize {
        self.captured_requests.lock().unwrap().len()
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        self.captured_requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Unknown("No mock response queued".to_string())))
    }
}

/// An `AgentInvoker` that replays scripted replies without running a model.
pub struct ScriptedAgent {
    replies: Mutex<Vec<Result<String, Error>>>,
    /// Prompts received, in call order.
    pub prompts: Mutex<Vec<String>>,
    /// Tool names offered on each call.
    pub offered_tools: Mutex<Vec<Vec<String>>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            offered_tools: Mutex::new(Vec::new()),
        }
    }

    /// Agent whose first call returns `text`.
    pub fn replying(text: &str) -> Self {
        let agent = Self::new();
        agent.queue_reply(text);
        agent
    }

    /// Agent whose first call fails with `error`.
    pub fn failing(error: Error) -> Self {
        let agent = Self::new();
        agent.replies.lock().unwrap().insert(0, Err(error));
        agent
    }

    pub fn queue_reply(&self, text: &str) {
        self.replies.lock().unwrap().insert(0, Ok(text.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl Default for ScriptedAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentInvoker for ScriptedAgent {
    async fn invoke(&self, prompt: &str, tools: Arc<ToolRegistry>) -> Result<String, Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.offered_tools
            .lock()
            .unwrap()
            .push(tools.names().into_iter().map(String::from).collect());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Unknown("No scripted reply queued".to_string())))
    }
}
