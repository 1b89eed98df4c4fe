//! MCP transport layer.

use async_trait::async_trait;
use rmcp::model::ClientInfo;
use rmcp::service::{ClientInitializeError, DynService, RoleClient, RunningService, ServiceExt};
use rmcp::transport::{StreamableHttpClientTransport, TokioChildProcess};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

pub type DynClientService = Box<dyn DynService<RoleClient>>;
pub type MCPRunningService = RunningService<RoleClient, DynClientService>;

/// Transport trait for MCP communication.
#[async_trait]
pub trait MCPTransport: Send + Sync {
    /// Open a connection and run the MCP initialize handshake.
    async fn connect(
        &self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError>;

    /// Human-readable target, for logs.
    fn describe(&self) -> String;
}

/// Where the tool server lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MCPEndpoint {
    /// A streamable HTTP MCP server.
    StreamableHttp { url: String },
    /// A local MCP server spoken to over stdin/stdout.
    Stdio { command: String, args: Vec<String> },
}

impl MCPEndpoint {
    pub fn http(url: impl Into<String>) -> Self {
        Self::StreamableHttp { url: url.into() }
    }

    pub fn stdio(command: impl Into<String>, args: Vec<String>) -> Self {
        Self::Stdio {
            command: command.into(),
            args,
        }
    }
}

#[async_trait]
impl MCPTransport for MCPEndpoint {
    async fn connect(
        &self,
        client_info: ClientInfo,
    ) -> Result<MCPRunningService, ClientInitializeError> {
        match self {
            Self::StreamableHttp { url } => {
                let transport = StreamableHttpClientTransport::from_uri(url.clone());
                client_info.into_dyn().serve(transport).await
            }
            Self::Stdio { command, args } => {
                let mut cmd = Command::new(command);
                cmd.args(args);
                let transport = TokioChildProcess::new(cmd).map_err(|error| {
                    ClientInitializeError::transport::<TokioChildProcess>(
                        error,
                        "spawn stdio transport",
                    )
                })?;
                client_info.into_dyn().serve(transport).await
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::StreamableHttp { url } => url.clone(),
            Self::Stdio { command, args } if args.is_empty() => command.clone(),
            Self::Stdio { command, args } => format!("{command} {}", args.join(" ")),
        }
    }
}
