//! Retry logic with exponential backoff
//!
//! Used for registry metadata lookups, which are idempotent reads. Publishing
//! is never retried.

use crate::core::config::RetryConfig;
use crate::core::error::RegistryError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Options for retry behavior
#[derive(Debug, Clone)]
pub struct RetryOptions {
    /// Maximum number of attempts (including the first one)
    pub max_attempts: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryOptions {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: 2.0,
        }
    }
}

/// Retry manager for executing operations with exponential backoff
///
/// Only errors for which [`RegistryError::is_retryable`] holds are retried;
/// everything else is returned on the first failure.
///
/// # Examples
///
/// ```no_run
/// use types_registry_publisher::core::{RegistryError, RetryManager, RetryOptions};
///
/// # async fn example() -> Result<(), RegistryError> {
/// let manager = RetryManager::new(RetryOptions::default());
///
/// let value = manager.retry(|| async { Ok::<_, RegistryError>(42) }).await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetryManager {
    options: RetryOptions,
}

impl RetryManager {
    pub fn new(options: RetryOptions) -> Self {
        Self { options }
    }

    /// Execute the given async operation with retry logic
    pub async fn retry<F, Fut, T>(&self, mut operation: F) -> Result<T, RegistryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RegistryError>>,
    {
        let mut delay = self.options.initial_delay;
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) if !error.is_retryable() || attempt >= self.options.max_attempts => {
                    return Err(error);
                }
                Err(error) => {
                    tracing::debug!(attempt, ?delay, %error, "retrying after transient failure");
                    sleep(delay).await;

                    delay = Duration::from_secs_f64(
                        delay.as_secs_f64() * self.options.backoff_multiplier,
                    )
                    .min(self.options.max_delay);
                    attempt += 1;
                }
            }
        }
    }
}
