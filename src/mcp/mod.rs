//! Model Context Protocol (MCP) client and tool bridge.

pub mod bridge;
pub mod client;
pub mod transport;

pub use bridge::{MCPToolBridge, ToolBridge};
pub use client::MCPClient;
pub use transport::{MCPEndpoint, MCPTransport};
