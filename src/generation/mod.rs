//! Model invocation and response parsing.

pub mod invoker;
pub mod parse;

pub use invoker::{ModelInvoker, ModelSelection};
pub use parse::{extract_text, extract_tool_calls, ModelInvocationOutcome, NO_RESPONSE_PLACEHOLDER};
