//! Error classification.

use serde::Serialize;

/// Broad error category; decides retry eligibility and the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Server,
    Api,
    Exhausted,
    Configuration,
    Serialization,
    ToolExecution,
    InvalidRequest,
    Unknown,
}
