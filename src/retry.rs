use std::future::Future;
use std::time::Duration;

use crate::error::Error;

/// Configuration for retrying transient transport failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first failure.
    pub max_retries: u32,
    /// Delay between retry attempts in milliseconds. Doubled on every attempt.
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl RetryConfig {
    /// Configuration that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            retry_delay_ms: 0,
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_delay_ms.saturating_mul(factor))
    }
}

/// Runs `operation` until it succeeds, fails with a non-transient error,
/// or the retry budget is spent.
pub(crate) async fn retry<T, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempts = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            // Rate limiting and load balancer switches clear up after a short wait.
            Err(e) if e.is_transient() && attempts < config.max_retries => {
                attempts += 1;
                let delay = config.delay(attempts);
                log::debug!(
                    "{operation_name} failed with transient error (attempt {attempts}/{}), retrying in {}ms: {e}",
                    config.max_retries,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                if attempts > 0 {
                    log::debug!("{operation_name} failed after {attempts} retries: {e}");
                }
                return Err(e);
            }
        }
    }
}
