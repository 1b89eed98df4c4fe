//! Tool Invocation Bridge: one MCP session per tool call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ChatError;

use super::client::{decode_tool_payload, MCPClient};
use super::transport::MCPTransport;

/// Executes a named tool with structured arguments.
#[async_trait]
pub trait ToolBridge: Send + Sync {
    async fn call(&self, tool_name: &str, arguments: Map<String, Value>) -> Result<Value, ChatError>;
}

/// [`ToolBridge`] backed by an MCP server.
///
/// Every call opens its own session and closes it before returning,
/// whether the call succeeded or not. There is no retry here.
pub struct MCPToolBridge {
    transport: Arc<dyn MCPTransport>,
}

impl MCPToolBridge {
    pub fn new(transport: Arc<dyn MCPTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ToolBridge for MCPToolBridge {
    async fn call(&self, tool_name: &str, arguments: Map<String, Value>) -> Result<Value, ChatError> {
        debug!(tool = tool_name, server = %self.transport.describe(), "Calling MCP tool");

        let client = MCPClient::connect(self.transport.as_ref(), tool_name).await?;
        let result = client.call_tool(tool_name, arguments).await;
        client.close().await;

        decode_tool_payload(tool_name, result?)
    }
}
