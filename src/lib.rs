//! elpris: a chat service that answers questions about Swedish electricity
//! prices with Google Gemini, calling the `get_el_price` MCP tool when the
//! model needs exact figures.
//!
//! A turn runs at most two model rounds: the first may request tool calls,
//! the second answers with the tool results in context.
//!
//! ```no_run
//! use elpris::chat::Orchestrator;
//! use elpris::config::ServiceConfig;
//!
//! # async fn example() -> elpris::error::Result<()> {
//! let config = ServiceConfig::load(None)?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let reply = orchestrator.handle_turn("Vad kostar elen i SE3 idag?").await?;
//! println!("{}", reply.reply);
//! # Ok(())
//! # }
//! ```

pub mod chat;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod mcp;
pub mod provider;
pub mod server;
pub mod tools;
pub mod types;
pub mod util;
