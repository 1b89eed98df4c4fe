//! Google Gemini API provider.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::ChatError;
use crate::types::{ConversationTurn, ModelResponse, Role};

use super::http::{build_client, status_to_error};
use super::{ModelProvider, ProviderRequest};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ChatError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ChatError::Configuration("Missing GEMINI_API_KEY".into()));
        }
        Ok(Self {
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
            client: build_client(timeout)?,
        })
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Result<Value, ChatError> {
        let contents = request
            .contents
            .iter()
            .filter(|turn| !turn.is_empty())
            .map(wire_content)
            .collect::<Result<Vec<_>, _>>()?;

        if contents.is_empty() {
            return Err(ChatError::InvalidState(
                "refusing to send a conversation without content".into(),
            ));
        }

        let mut body = Map::new();
        body.insert("contents".into(), Value::Array(contents));

        if let Some(system) = &request.system_instruction {
            body.insert(
                "systemInstruction".into(),
                json!({ "parts": [{ "text": system }] }),
            );
        }

        if !request.tools.is_empty() {
            let declarations: Vec<Value> = request
                .tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description,
                        "parameters": tool.parameters,
                    })
                })
                .collect();
            body.insert(
                "tools".into(),
                json!([{ "functionDeclarations": declarations }]),
            );
        }

        let settings = &request.settings;
        if !settings.is_empty() {
            let mut gen_config = Map::new();
            if let Some(max) = settings.max_output_tokens {
                gen_config.insert("maxOutputTokens".into(), max.into());
            }
            if let Some(temp) = settings.temperature {
                gen_config.insert("temperature".into(), temp.into());
            }
            if let Some(top_p) = settings.top_p {
                gen_config.insert("topP".into(), top_p.into());
            }
            body.insert("generationConfig".into(), Value::Object(gen_config));
        }

        Ok(Value::Object(body))
    }
}

/// Serialise a turn with Gemini's wire role names.
fn wire_content(turn: &ConversationTurn) -> Result<Value, ChatError> {
    let role = match turn.role {
        Role::User => "user",
        Role::Model => "model",
        Role::Tool => "function",
    };
    Ok(json!({
        "role": role,
        "parts": serde_json::to_value(&turn.parts)?,
    }))
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate_content(
        &self,
        model_id: &str,
        request: &ProviderRequest,
    ) -> Result<ModelResponse, ChatError> {
        let body = self.build_request_body(request)?;
        let url = format!("{}/models/{}:generateContent", self.base_url, model_id);

        debug!(model = model_id, turns = request.contents.len(), "Google generate_content");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout(self.timeout.as_millis() as u64)
                } else {
                    ChatError::Network(e)
                }
            })?;

        let status = resp.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let bytes = resp.bytes().await?;
        let data: ModelResponse = serde_json::from_slice(&bytes)?;

        if let Some(usage) = &data.usage_metadata {
            debug!(
                model = model_id,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Google usage"
            );
        }

        Ok(data)
    }
}
