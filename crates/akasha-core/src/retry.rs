use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounded exponential backoff for retryable errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay_ms,
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.base_delay_ms.saturating_mul(2_u64.saturating_pow(attempt)))
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation,
                        attempt + 1,
                        self.max_retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn should_double_delay_per_attempt() {
        let policy = RetryPolicy::new(3, 100);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn should_retry_retryable_errors_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, 0);

        let result = policy
            .run("flaky", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(Error::provider("temporarily unavailable"))
                } else {
                    Ok(42)
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn should_not_retry_non_retryable_errors() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, 0);

        let result: Result<()> = policy
            .run("malformed", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::malformed("bad json"))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn should_give_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, 0);

        let result: Result<()> = policy
            .run("down", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(Error::storage("connection refused"))
            })
            .await;

        assert_eq!(result, Err(Error::storage("connection refused")));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
