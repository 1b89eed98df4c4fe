//! Shared test helpers: a scripted model provider and a recording tool bridge.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::time::Instant;

use elpris::chat::Orchestrator;
use elpris::error::ChatError;
use elpris::generation::{ModelInvoker, ModelSelection};
use elpris::mcp::ToolBridge;
use elpris::provider::{ModelProvider, ProviderRequest};
use elpris::tools::price_tool;
use elpris::types::{ConversationTurn, ModelResponse};
use elpris::util::RetryPolicy;

pub const PRIMARY: &str = "gemini-primary";
pub const FALLBACK: &str = "gemini-fallback";

/// A model response holding a single text part.
pub fn text_response(text: &str) -> ModelResponse {
    serde_json::from_value(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
    .expect("text fixture should deserialize")
}

/// A model response asking for the given `(name, args)` function calls.
pub fn tool_call_response(calls: &[(&str, Value)]) -> ModelResponse {
    let parts: Vec<Value> = calls
        .iter()
        .map(|(name, args)| json!({ "functionCall": { "name": name, "args": args } }))
        .collect();
    serde_json::from_value(json!({
        "candidates": [{
            "content": { "role": "model", "parts": parts },
            "finishReason": "STOP"
        }]
    }))
    .expect("tool call fixture should deserialize")
}

pub fn overloaded() -> ChatError {
    ChatError::api(503, "UNAVAILABLE: The model is overloaded. Please try again later.")
}

/// One recorded `generate_content` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model_id: String,
    pub contents: Vec<ConversationTurn>,
    pub system_instruction: Option<String>,
    pub at: Instant,
}

/// A provider that replays a queue of canned results.
///
/// Once the queue is empty every call answers with a plain text response.
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<Result<ModelResponse, ChatError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, result: Result<ModelResponse, ChatError>) -> &Self {
        self.script.lock().unwrap().push_back(result);
        self
    }

    pub fn queue_text(&self, text: &str) -> &Self {
        self.queue(Ok(text_response(text)))
    }

    pub fn queue_tool_calls(&self, calls: &[(&str, Value)]) -> &Self {
        self.queue(Ok(tool_call_response(calls)))
    }

    pub fn queue_error(&self, error: ChatError) -> &Self {
        self.queue(Err(error))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate_content(
        &self,
        model_id: &str,
        request: &ProviderRequest,
    ) -> Result<ModelResponse, ChatError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model_id: model_id.to_string(),
            contents: request.contents.clone(),
            system_instruction: request.system_instruction.clone(),
            at: Instant::now(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("Mock response")))
    }
}

type ToolHandler = Box<dyn Fn(&str, &Map<String, Value>) -> Result<Value, ChatError> + Send + Sync>;

/// A tool bridge that records every call and answers through a handler.
pub struct MockToolBridge {
    handler: ToolHandler,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl MockToolBridge {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &Map<String, Value>) -> Result<Value, ChatError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with `payload`.
    pub fn returning(payload: Value) -> Self {
        Self::new(move |_, _| Ok(payload.clone()))
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolBridge for MockToolBridge {
    async fn call(&self, tool_name: &str, arguments: Map<String, Value>) -> Result<Value, ChatError> {
        let result = (self.handler)(tool_name, &arguments);
        self.calls
            .lock()
            .unwrap()
            .push((tool_name.to_string(), arguments));
        result
    }
}

/// The price payload the tool server returns for SE3.
pub fn se3_price_payload() -> Value {
    json!({
        "area": "SE3",
        "date": "2025-01-15",
        "summary": {
            "avg_SEK_per_kWh": 1.23,
            "min_SEK_per_kWh": 0.85,
            "max_SEK_per_kWh": 1.9
        }
    })
}

/// An orchestrator over the mocks with a fixed instruction and the given retry policy.
pub fn orchestrator(
    provider: Arc<MockProvider>,
    bridge: Arc<MockToolBridge>,
    retry: RetryPolicy,
    fallback: Option<&str>,
) -> Orchestrator {
    let invoker = ModelInvoker::new(
        provider,
        ModelSelection::new(PRIMARY, fallback.map(str::to_string)),
        retry,
    )
    .with_tools(vec![price_tool()]);
    Orchestrator::new(invoker, bridge).with_system_instruction("Du är en testassistent.")
}
