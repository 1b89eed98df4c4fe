//! Extract tool calls and text from a raw model response.

use tracing::debug;

use crate::types::{ConversationTurn, ModelResponse, Role, ToolCallRequest};

/// Returned by [`extract_text`] when no candidate carries any text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "(no response)";

/// Every function call in every candidate, in order.
pub fn extract_tool_calls(response: &ModelResponse) -> Vec<ToolCallRequest> {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.function_calls())
        .map(ToolCallRequest::from)
        .collect()
}

/// Text of the first candidate that has any, parts joined by newline.
pub fn extract_text(response: &ModelResponse) -> String {
    response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .map(|content| content.texts().collect::<Vec<_>>().join("\n"))
        .find(|text| !text.trim().is_empty())
        .unwrap_or_else(|| NO_RESPONSE_PLACEHOLDER.to_string())
}

/// The parsed result of one model invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInvocationOutcome {
    /// Text parts of the first candidate that has any.
    pub text_parts: Vec<String>,
    /// Calls from the first candidate only, so every call has a matching
    /// part in `raw_model_turn`.
    pub tool_calls: Vec<ToolCallRequest>,
    /// First candidate's content exactly as the model returned it.
    pub raw_model_turn: ConversationTurn,
}

impl ModelInvocationOutcome {
    pub fn from_response(response: &ModelResponse) -> Self {
        let raw_parts = response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| content.parts.clone())
            .unwrap_or_default();

        let text_parts = response
            .candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .map(|content| content.texts().map(str::to_string).collect::<Vec<_>>())
            .find(|parts| !parts.join("\n").trim().is_empty())
            .unwrap_or_default();

        let raw_model_turn = ConversationTurn {
            role: Role::Model,
            parts: raw_parts,
        };
        let tool_calls: Vec<ToolCallRequest> = raw_model_turn
            .function_calls()
            .map(ToolCallRequest::from)
            .collect();

        let dropped = extract_tool_calls(response).len() - tool_calls.len();
        if dropped > 0 {
            debug!(dropped, "Ignoring tool calls from secondary candidates");
        }

        Self {
            text_parts,
            tool_calls,
            raw_model_turn,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Reply text: joined text parts, or the placeholder when there are none.
    pub fn text(&self) -> String {
        let joined = self.text_parts.join("\n");
        if joined.trim().is_empty() {
            NO_RESPONSE_PLACEHOLDER.to_string()
        } else {
            joined
        }
    }
}
