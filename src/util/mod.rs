//! Utility modules: retry and fallback.

pub mod retry;

pub use retry::{with_fallback, RetryPolicy};
