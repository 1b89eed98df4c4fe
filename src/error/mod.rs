//! Error types for the chat service.

pub mod unified;

pub use unified::ErrorCategory;

use thiserror::Error;

/// Primary error type for every chat turn and for process startup.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Model {model} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        model: String,
        attempts: u32,
        #[source]
        last: Box<ChatError>,
    },

    #[error("Tool {tool_name} unreachable: {message}")]
    ToolUnreachable { tool_name: String, message: String },

    #[error("Tool {tool_name} protocol error: {message}")]
    ToolProtocol { tool_name: String, message: String },

    #[error("Tool {tool_name} returned a malformed response: {message}")]
    ToolMalformedResponse { tool_name: String, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Message fragments the Gemini API uses when it sheds load.
const OVERLOAD_MARKERS: &[&str] = &[
    "overloaded",
    "resource_exhausted",
    "unavailable",
    "rate limit",
    "quota",
    "try again later",
];

fn signals_overload(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    OVERLOAD_MARKERS.iter().any(|marker| lower.contains(marker))
}

impl ChatError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn tool_unreachable(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolUnreachable {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    pub fn tool_protocol(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolProtocol {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    pub fn tool_malformed(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolMalformedResponse {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited(_) => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, message } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 | 503 => ErrorCategory::RateLimit,
                _ if signals_overload(message) => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::RetriesExhausted { .. } => ErrorCategory::Exhausted,
            Self::ToolUnreachable { .. }
            | Self::ToolProtocol { .. }
            | Self::ToolMalformedResponse { .. } => ErrorCategory::ToolExecution,
            Self::InvalidRequest(_) => ErrorCategory::InvalidRequest,
            Self::Io(_) | Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether a model call that failed with this error may be retried.
    ///
    /// Only overload and rate-limit signals qualify. Everything else,
    /// including network failures and timeouts, surfaces at once.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::RateLimit
    }

    /// HTTP status reported to the caller when a turn fails with this error.
    pub fn status_code(&self) -> u16 {
        match self.category() {
            ErrorCategory::InvalidRequest => 400,
            _ => 500,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ChatError>;
