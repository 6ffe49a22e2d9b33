//! Common utilities for collaborator implementations

use std::time::Duration;

use crate::{
    CollectorError,
    CollectorResult,
};

/// Retry policy for idempotent read calls.
///
/// Metric publishes must never go through this: the sink has no idempotency
/// key, so a retried publish can double count.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, the first one included
    pub max_retries: usize,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Whether to use exponential backoff
    pub exponential_backoff: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            exponential_backoff: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_delay: Duration, exponential_backoff: bool) -> Self {
        Self {
            max_retries,
            initial_delay,
            exponential_backoff,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, false)
    }

    /// Executes an operation with retry logic
    ///
    /// # Example
    ///
    /// ```ignore
    /// use dora_metrics_api::utils::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// let state = policy.retry(|| client.get_pipeline_state("app")).await?;
    /// ```
    pub async fn retry<F, Fut, T>(&self, operation: F) -> CollectorResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = CollectorResult<T>>,
    {
        let mut delay = self.initial_delay;
        let mut last_error = None;

        for attempt in 0..self.max_retries.max(1) {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt + 1 < self.max_retries && e.is_transient() => {
                    tracing::debug!(attempt = attempt + 1, error = %e, "Retrying collaborator call");
                    last_error = Some(e);
                    tokio::time::sleep(delay).await;
                    if self.exponential_backoff {
                        delay *= 2;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| CollectorError::NetworkError("Max retries exceeded".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_retry_success() {
        let policy = RetryPolicy::default();
        let result = policy.retry(|| async { Ok::<_, CollectorError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_retry_eventual_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), false);
        let attempts = std::cell::Cell::new(0);

        let result = policy
            .retry(|| async {
                let count = attempts.get() + 1;
                attempts.set(count);
                if count < 2 {
                    Err(CollectorError::NetworkError("Temporary failure".to_string()))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test]
    async fn test_pipeline_not_found_is_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), false);
        let attempts = std::cell::Cell::new(0);

        let result: CollectorResult<()> = policy
            .retry(|| async {
                attempts.set(attempts.get() + 1);
                Err(CollectorError::PipelineNotFound("app".to_string()))
            })
            .await;

        assert!(matches!(result, Err(CollectorError::PipelineNotFound(_))));
        assert_eq!(attempts.get(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), true);
        let attempts = std::cell::Cell::new(0);

        let result: CollectorResult<()> = policy
            .retry(|| async {
                attempts.set(attempts.get() + 1);
                Err(CollectorError::Throttled("Rate exceeded".to_string()))
            })
            .await;

        assert!(matches!(result, Err(CollectorError::Throttled(_))));
        assert_eq!(attempts.get(), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), false);
        let attempts = std::cell::Cell::new(0);

        let result: CollectorResult<()> = policy
            .retry(|| async {
                attempts.set(attempts.get() + 1);
                Err(CollectorError::ApiError("400 ValidationException: bad id".to_string()))
            })
            .await;

        assert!(matches!(result, Err(CollectorError::ApiError(_))));
        assert_eq!(attempts.get(), 1);
    }
}
