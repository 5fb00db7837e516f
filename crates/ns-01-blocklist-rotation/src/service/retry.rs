//! Bounded retry with exponential backoff for outbound calls.

use std::future::Future;
use tracing::warn;

use crate::domain::{BackendError, Operation, RetryPolicy};

/// Run `f` until it succeeds, fails with a non-retryable error, or the
/// attempt budget of `policy` is spent.
///
/// Each attempt is bounded by `policy.attempt_timeout`; an elapsed attempt
/// counts as `BackendError::Timeout`, which is retryable.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: Operation,
    mut f: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let result = match tokio::time::timeout(policy.attempt_timeout, f()).await {
            Ok(result) => result,
            Err(_elapsed) => Err(BackendError::Timeout(policy.attempt_timeout)),
        };

        match result {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = %operation,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "[ns-01] outbound call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
