//! HTTP client construction and status mapping.

use std::time::Duration;

use crate::error::ChatError;

/// Build the reqwest client a provider owns for its lifetime.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ChatError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| ChatError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Map a non-success HTTP status and body to an error.
pub fn status_to_error(status: u16, body: &str) -> ChatError {
    let message = extract_error_message(body).unwrap_or_else(|| body.to_string());
    match status {
        401 | 403 => ChatError::Authentication(message),
        429 => ChatError::RateLimited(message),
        _ => ChatError::api(status, message),
    }
}

/// Pull `error.status: error.message` out of a Google-style error body.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message").and_then(|m| m.as_str())?;
    Some(match error.get("status").and_then(|s| s.as_str()) {
        Some(status) => format!("{status}: {message}"),
        None => message.to_string(),
    })
}
