use std::time::Duration;
use std::future::Future;

use super::classification::ErrorClassification;
use super::types::ScopeError;
use tracing::warn;

impl ErrorClassification {
    /// Calculate the retry delay for this error classification based on the
    /// current attempt number (0-indexed).
    ///
    /// - StoreUnavailableError: 250ms * 2^attempt + jitter (0-250ms), capped at 10s
    /// - Default: exponential backoff 2^attempt seconds + jitter (0-1s), capped at 30s
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        match self.error_type {
            "StoreUnavailableError" => {
                let base_ms = 250u64.saturating_mul(1u64 << attempt.min(16));
                let jitter_ms = (rand::random::<f64>() * 250.0) as u64;
                Duration::from_millis((base_ms + jitter_ms).min(10_000))
            }
            _ => {
                let base: f64 = 2.0_f64.powi(attempt as i32);
                let jitter: f64 = rand::random::<f64>();
                let secs = (base + jitter).min(30.0);
                Duration::from_secs_f64(secs)
            }
        }
    }
}

/// Retry configuration for store and network operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_retries: 3 }
    }
}

impl RetryConfig {
    pub fn no_retries() -> Self {
        Self { max_retries: 0 }
    }
}

/// Execute an async operation with retry logic.
///
/// Retries only if the error is classified as retryable and we haven't
/// exceeded max_retries.
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    config: &RetryConfig,
    mut factory: F,
) -> Result<T, ScopeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScopeError>>,
{
    let max_attempts = config.max_retries + 1;
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match factory().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let classification = e.classify();

                if !classification.retryable || attempt + 1 >= max_attempts {
                    if !classification.retryable {
                        warn!(
                            operation = operation_name,
                            error_type = classification.error_type,
                            "Non-retryable error, failing immediately"
                        );
                    } else {
                        warn!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            max = max_attempts,
                            "Max retries exhausted"
                        );
                    }
                    return Err(e);
                }

                let delay = classification.retry_delay(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max = max_attempts,
                    error_type = classification.error_type,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after error"
                );

                tokio::time::sleep(delay).await;
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| ScopeError::Internal("Retry loop exited unexpectedly".into())))
}
