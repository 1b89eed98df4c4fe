//! Resilient model invocation: retry with backoff, then model fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ChatError;
use crate::provider::{ModelProvider, ProviderRequest, ToolDefinition};
use crate::types::{Candidate, ConversationTurn, FinishReason, GenerationSettings};
use crate::util::retry::{with_fallback, RetryPolicy};

use super::parse::ModelInvocationOutcome;

/// Which models a round may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub primary: String,
    pub fallback: Option<String>,
}

impl ModelSelection {
    pub fn new(primary: impl Into<String>, fallback: Option<String>) -> Self {
        Self {
            primary: primary.into(),
            fallback,
        }
    }
}

/// Wraps one generation call with retry and fallback.
pub struct ModelInvoker {
    provider: Arc<dyn ModelProvider>,
    models: ModelSelection,
    retry: RetryPolicy,
    tools: Vec<ToolDefinition>,
    settings: GenerationSettings,
}

impl ModelInvoker {
    pub fn new(provider: Arc<dyn ModelProvider>, models: ModelSelection, retry: RetryPolicy) -> Self {
        Self {
            provider,
            models,
            retry,
            tools: Vec::new(),
            settings: GenerationSettings::default(),
        }
    }

    /// Declare the tools offered to the model on every call.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    fn request(&self, system_instruction: &str, conversation: &[ConversationTurn]) -> ProviderRequest {
        ProviderRequest {
            system_instruction: Some(system_instruction.to_string()),
            contents: conversation.to_vec(),
            tools: self.tools.clone(),
            settings: self.settings.clone(),
        }
    }

    /// One model, all retry attempts.
    pub async fn invoke(
        &self,
        model_id: &str,
        system_instruction: &str,
        conversation: &[ConversationTurn],
    ) -> Result<ModelInvocationOutcome, ChatError> {
        let request = self.request(system_instruction, conversation);
        let response = self
            .retry
            .execute(model_id, || self.provider.generate_content(model_id, &request))
            .await?;

        let finish_reason = response.candidates.first().and_then(Candidate::finish_reason);
        if finish_reason == Some(FinishReason::MalformedFunctionCall) {
            warn!(model = model_id, "Model produced a malformed function call");
        }

        let outcome = ModelInvocationOutcome::from_response(&response);
        debug!(
            model = model_id,
            finish_reason = ?finish_reason,
            tool_calls = outcome.tool_calls.len(),
            text_parts = outcome.text_parts.len(),
            "Model invocation finished"
        );
        Ok(outcome)
    }

    /// Primary model with retry; on failure, the fallback model with retry.
    pub async fn invoke_with_fallback(
        &self,
        system_instruction: &str,
        conversation: &[ConversationTurn],
    ) -> Result<ModelInvocationOutcome, ChatError> {
        with_fallback(
            &self.models.primary,
            self.models.fallback.as_deref(),
            |model| async move { self.invoke(&model, system_instruction, conversation).await },
        )
        .await
    }
}
