//! Two-round tool-augmented conversation.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::ChatError;
use crate::generation::{ModelInvoker, ModelSelection};
use crate::mcp::{MCPToolBridge, ToolBridge};
use crate::provider::GoogleProvider;
use crate::tools::{price_tool, PRICE_TOOL_NAME};
use crate::types::{ConversationTurn, GenerationSettings, ToolCallRequest, ToolCallResult};

use super::prompt::system_instruction;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Missing and `null` both mean an empty message.
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// What a turn did besides producing a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    pub rounds: u8,
    pub tools_executed: Vec<String>,
    pub tools_skipped: Vec<String>,
}

/// Drives one user message through at most two model rounds.
///
/// Holds no per-conversation state; a single instance serves all requests.
pub struct Orchestrator {
    invoker: ModelInvoker,
    tools: Arc<dyn ToolBridge>,
    instruction: Box<dyn Fn() -> String + Send + Sync>,
}

impl Orchestrator {
    pub fn new(invoker: ModelInvoker, tools: Arc<dyn ToolBridge>) -> Self {
        Self {
            invoker,
            tools,
            instruction: Box::new(|| system_instruction(chrono::Local::now().date_naive())),
        }
    }

    /// Wire the Gemini provider and MCP bridge described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ChatError> {
        let gemini = &config.gemini;
        let provider = GoogleProvider::new(
            gemini.api_key.clone().unwrap_or_default(),
            Some(gemini.base_url.clone()),
            gemini.request_timeout(),
        )?;
        let settings = GenerationSettings::builder()
            .maybe_temperature(gemini.temperature)
            .maybe_max_output_tokens(gemini.max_output_tokens)
            .build();
        let invoker = ModelInvoker::new(
            Arc::new(provider),
            ModelSelection::new(gemini.model.clone(), gemini.fallback()),
            config.retry.policy(),
        )
        .with_tools(vec![price_tool()])
        .with_settings(settings);
        let bridge = MCPToolBridge::new(Arc::new(config.mcp.endpoint()));

        Ok(Self::new(invoker, Arc::new(bridge)))
    }

    /// Replace the date-stamped system instruction with a fixed one.
    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        self.instruction = Box::new(move || instruction.clone());
        self
    }

    pub async fn handle_turn(&self, message: &str) -> Result<ChatReply, ChatError> {
        self.handle_turn_with_report(message).await.map(|(reply, _)| reply)
    }

    pub async fn handle_turn_with_report(
        &self,
        message: &str,
    ) -> Result<(ChatReply, TurnReport), ChatError> {
        let instruction = (self.instruction)();
        let user = ConversationTurn::user(message);
        let mut report = TurnReport::default();

        let first = self
            .invoker
            .invoke_with_fallback(&instruction, std::slice::from_ref(&user))
            .await?;
        report.rounds = 1;

        if !first.has_tool_calls() {
            info!(rounds = report.rounds, "Turn answered without tools");
            return Ok((ChatReply { reply: first.text() }, report));
        }

        let (recognised, skipped): (Vec<&ToolCallRequest>, Vec<&ToolCallRequest>) = first
            .tool_calls
            .iter()
            .partition(|call| call.name == PRICE_TOOL_NAME);

        for call in &skipped {
            warn!(tool = %call.name, "Skipping call to unknown tool");
        }
        report.tools_skipped = skipped.iter().map(|call| call.name.clone()).collect();

        let results = try_join_all(recognised.iter().map(|call| self.execute(call))).await?;
        report.tools_executed = results.iter().map(|result| result.name.clone()).collect();

        let conversation = [
            user,
            first.raw_model_turn,
            ConversationTurn::tool_responses(&results),
        ];
        let second = self
            .invoker
            .invoke_with_fallback(&instruction, &conversation)
            .await?;
        report.rounds = 2;

        if second.has_tool_calls() {
            debug!(
                ignored = second.tool_calls.len(),
                "Ignoring tool calls in the final round"
            );
        }

        info!(
            rounds = report.rounds,
            executed = report.tools_executed.len(),
            skipped = report.tools_skipped.len(),
            "Turn answered with tool results"
        );
        Ok((ChatReply { reply: second.text() }, report))
    }

    async fn execute(&self, call: &ToolCallRequest) -> Result<ToolCallResult, ChatError> {
        let response = self.tools.call(&call.name, call.arguments.clone()).await?;
        Ok(ToolCallResult {
            name: call.name.clone(),
            response,
        })
    }
}
