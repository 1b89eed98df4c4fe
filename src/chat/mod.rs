//! Conversation orchestration.

pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{ChatReply, ChatRequest, ErrorBody, Orchestrator, TurnReport};
pub use prompt::system_instruction;
