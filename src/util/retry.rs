//! Retry with a fixed backoff schedule, and model fallback.

use std::future::Future;
use std::time::Duration;

use crate::error::ChatError;

/// Backoff schedule used when the model signals a transient failure.
///
/// The first attempt runs immediately; attempt `n + 1` waits `delays[n]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_millis(&[500, 1000, 2000, 4000])
    }
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self::new(delays_ms.iter().copied().map(Duration::from_millis).collect())
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(Vec::new())
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Maximum number of attempts (including the first).
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }

    /// Execute an async operation with retry.
    ///
    /// Non-retryable errors are returned as-is. When every attempt fails with
    /// a retryable error, the last one is wrapped in
    /// [`ChatError::RetriesExhausted`].
    pub async fn execute<F, Fut, T>(&self, label: &str, mut operation: F) -> Result<T, ChatError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChatError>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            let Some(delay) = self.delays.get(attempt as usize - 1).copied() else {
                return Err(ChatError::RetriesExhausted {
                    model: label.to_string(),
                    attempts: max_attempts,
                    last: Box::new(error),
                });
            };

            tracing::warn!(
                model = label,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retrying after transient error"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Run `operation` against `primary`; if that fails, run it once more in
/// full against `secondary`.
///
/// The secondary's outcome is final. A missing secondary, or one equal to
/// the primary, disables the fallback.
pub async fn with_fallback<F, Fut, T>(
    primary: &str,
    secondary: Option<&str>,
    mut operation: F,
) -> Result<T, ChatError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ChatError>>,
{
    let error = match operation(primary.to_string()).await {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    match secondary {
        Some(secondary) if secondary != primary => {
            tracing::warn!(
                primary,
                fallback = secondary,
                error = %error,
                "Primary model failed, switching to fallback"
            );
            operation(secondary.to_string()).await
        }
        _ => Err(error),
    }
}
