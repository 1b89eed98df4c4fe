//! Short-lived MCP client session.

use rmcp::{
    model::{CallToolRequestParams, CallToolResult, ClientInfo, JsonObject, ProtocolVersion},
    service::{ClientInitializeError, ServiceError},
};
use serde_json::Value;

use crate::error::ChatError;

use super::transport::{MCPRunningService, MCPTransport};

/// One initialized MCP session.
///
/// Dropping the client cancels the underlying rmcp service; [`close`]
/// does the same but waits for the service task to finish.
///
/// [`close`]: MCPClient::close
pub struct MCPClient {
    session: MCPRunningService,
}

impl MCPClient {
    /// Connect and initialize. `tool_name` only labels errors.
    pub async fn connect(transport: &dyn MCPTransport, tool_name: &str) -> Result<Self, ChatError> {
        let client_info = ClientInfo {
            protocol_version: ProtocolVersion::LATEST,
            ..Default::default()
        };

        let session = transport
            .connect(client_info)
            .await
            .map_err(|e| map_client_initialize_error(tool_name, e))?;

        Ok(Self { session })
    }

    /// Execute one tool on the server and return the raw result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: JsonObject,
    ) -> Result<CallToolResult, ChatError> {
        self.session
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_owned().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|e| map_service_error(name, e))
    }

    /// Tear the session down.
    pub async fn close(self) {
        if let Err(error) = self.session.cancel().await {
            tracing::warn!(error = %error, "MCP session did not shut down cleanly");
        }
    }
}

/// Decode the JSON payload carried by the first content element.
pub fn decode_tool_payload(name: &str, result: CallToolResult) -> Result<Value, ChatError> {
    if result.is_error.unwrap_or(false) {
        let message = result
            .content
            .iter()
            .filter_map(|item| item.as_text().map(|text| text.text.clone()))
            .collect::<Vec<_>>()
            .join("\n");
        let message = if message.is_empty() {
            "tool returned an error result".to_string()
        } else {
            message
        };
        return Err(ChatError::tool_protocol(name, message));
    }

    let text = result
        .content
        .first()
        .and_then(|item| item.as_text())
        .map(|text| text.text.as_str())
        .ok_or_else(|| ChatError::tool_malformed(name, "reply has no text content"))?;

    serde_json::from_str(text)
        .map_err(|e| ChatError::tool_malformed(name, format!("reply text is not JSON: {e}")))
}

fn map_client_initialize_error(name: &str, error: ClientInitializeError) -> ChatError {
    match error {
        ClientInitializeError::ConnectionClosed(context) => {
            ChatError::tool_unreachable(name, format!("connection closed during initialize: {context}"))
        }
        ClientInitializeError::TransportError { error, context } => {
            ChatError::tool_unreachable(name, format!("transport error ({context}): {error}"))
        }
        ClientInitializeError::JsonRpcError(error) => ChatError::tool_protocol(
            name,
            format!("initialize JSON-RPC error {}: {}", error.code.0, error.message),
        ),
        ClientInitializeError::Cancelled => {
            ChatError::tool_unreachable(name, "initialize cancelled")
        }
        other => ChatError::tool_protocol(name, format!("initialize error: {other}")),
    }
}

fn map_service_error(name: &str, error: ServiceError) -> ChatError {
    match error {
        ServiceError::McpError(error) => ChatError::tool_protocol(
            name,
            format!("MCP error {}: {}", error.code.0, error.message),
        ),
        ServiceError::TransportSend(error) => {
            ChatError::tool_unreachable(name, format!("transport send failed: {error}"))
        }
        ServiceError::TransportClosed => ChatError::tool_unreachable(name, "transport closed"),
        ServiceError::UnexpectedResponse => {
            ChatError::tool_protocol(name, "unexpected MCP response")
        }
        ServiceError::Cancelled { reason } => {
            let suffix = reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default();
            ChatError::tool_unreachable(name, format!("request cancelled{suffix}"))
        }
        ServiceError::Timeout { timeout } => ChatError::tool_unreachable(
            name,
            format!("no reply within {}ms", timeout.as_millis()),
        ),
        other => ChatError::tool_protocol(name, format!("MCP service error: {other}")),
    }
}
