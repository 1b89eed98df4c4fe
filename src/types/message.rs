//! Conversation types exchanged with the model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Model,
    #[serde(alias = "function")]
    Tool,
}

/// One turn of a conversation: a role and its ordered content parts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

impl ConversationTurn {
    /// A user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![ContentPart::text(text)],
        }
    }

    /// A model turn with the given parts.
    pub fn model(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    /// A tool turn carrying one function response per result, in order.
    pub fn tool_responses(results: &[ToolCallResult]) -> Self {
        Self {
            role: Role::Tool,
            parts: results
                .iter()
                .map(|result| {
                    ContentPart::FunctionResponse(FunctionResponse {
                        name: result.name.clone(),
                        response: result.response.clone(),
                    })
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Function calls carried by this turn.
    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    /// Answer text carried by this turn. Thought summaries are left out.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            ContentPart::Text { text, extra, .. } if !is_thought(extra) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// The smallest unit of a conversation turn.
///
/// On the wire this is a Gemini `Part`: exactly one of `text`,
/// `functionCall` or `functionResponse`. Parts of any other kind, and
/// sibling fields such as `thought` or `partMetadata`, are kept as raw JSON
/// so a model turn can be sent back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePart", into = "WirePart")]
pub enum ContentPart {
    Text {
        text: String,
        thought_signature: Option<String>,
        extra: Map<String, Value>,
    },
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
    Other(Map<String, Value>),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: text.into(),
            thought_signature: None,
            extra: Map::new(),
        }
    }

    pub fn function_call(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self::FunctionCall(FunctionCall {
            id: None,
            name: name.into(),
            args,
            thought_signature: None,
            part_extra: Map::new(),
        })
    }
}

/// A function call emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub args: Map<String, Value>,
    /// Part-level signature Gemini attaches to calls made while thinking.
    #[serde(skip)]
    pub thought_signature: Option<String>,
    /// Other fields Gemini put next to `functionCall` in the same part.
    #[serde(skip)]
    pub part_extra: Map<String, Value>,
}

/// The result of a function call, sent back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl From<&FunctionCall> for ToolCallRequest {
    fn from(call: &FunctionCall) -> Self {
        Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.args.clone(),
        }
    }
}

/// A structured tool payload, correlated to its request by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub name: String,
    pub response: Value,
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_thought(extra: &Map<String, Value>) -> bool {
    extra.get("thought").and_then(Value::as_bool).unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<WirePart> for ContentPart {
    fn from(part: WirePart) -> Self {
        if let Some(mut call) = part.function_call {
            call.thought_signature = part.thought_signature;
            call.part_extra = part.extra;
            return Self::FunctionCall(call);
        }
        if let Some(response) = part.function_response {
            return Self::FunctionResponse(response);
        }
        if let Some(text) = part.text {
            return Self::Text {
                text,
                thought_signature: part.thought_signature,
                extra: part.extra,
            };
        }

        let mut raw = part.extra;
        if let Some(signature) = part.thought_signature {
            raw.insert("thoughtSignature".into(), Value::String(signature));
        }
        Self::Other(raw)
    }
}

impl From<ContentPart> for WirePart {
    fn from(part: ContentPart) -> Self {
        match part {
            ContentPart::Text {
                text,
                thought_signature,
                extra,
            } => Self {
                text: Some(text),
                thought_signature,
                extra,
                ..Default::default()
            },
            ContentPart::FunctionCall(mut call) => Self {
                thought_signature: call.thought_signature.take(),
                extra: std::mem::take(&mut call.part_extra),
                function_call: Some(call),
                ..Default::default()
            },
            ContentPart::FunctionResponse(response) => Self {
                function_response: Some(response),
                ..Default::default()
            },
            ContentPart::Other(extra) => Self {
                extra,
                ..Default::default()
            },
        }
    }
}
