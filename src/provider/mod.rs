//! Model provider trait and the Gemini implementation.

pub mod google;
pub mod http;

pub use google::GoogleProvider;

use async_trait::async_trait;

use crate::error::ChatError;
use crate::types::{ConversationTurn, GenerationSettings, ModelResponse};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub system_instruction: Option<String>,
    pub contents: Vec<ConversationTurn>,
    pub tools: Vec<ToolDefinition>,
    pub settings: GenerationSettings,
}

impl ProviderRequest {
    pub fn new(contents: Vec<ConversationTurn>) -> Self {
        Self {
            system_instruction: None,
            contents,
            tools: Vec::new(),
            settings: GenerationSettings::default(),
        }
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A model backend able to run one generation call.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "google").
    fn provider_name(&self) -> &str;

    /// Run a single non-streaming generation against `model_id`.
    async fn generate_content(
        &self,
        model_id: &str,
        request: &ProviderRequest,
    ) -> Result<ModelResponse, ChatError>;
}
