//! Retry with exponential backoff for JIRA and Tempo calls.
//!
//! Rate limits (429) and transient server failures are retried; any other
//! HTTP error is returned on the first attempt. A `Retry-After` header from the
//! upstream overrides the computed delay, capped at `max_delay`.

use std::{
    future::Future,
    time::{Duration, Instant},
};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::{IntegrationError, Result};

/// Configuration for retry behavior with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (excluding initial attempt)
    pub max_retries:        u32,
    /// Initial delay before first retry
    pub initial_delay:      Duration,
    /// Maximum delay cap
    pub max_delay:          Duration,
    /// Multiplier for exponential backoff calculation
    pub backoff_multiplier: f64,
    /// Whether to add ±10% jitter
    pub jitter:             bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries:        3,
            initial_delay:      Duration::from_millis(500),
            max_delay:          Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter:             true,
        }
    }
}

impl RetryConfig {
    /// No retries at all; the first failure is returned.
    pub fn none() -> Self { Self::default().with_max_retries(0) }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let base_delay = self.initial_delay.as_millis() as f64;
        let exponential_delay = base_delay * self.backoff_multiplier.powi(attempt as i32);
        let mut delay = Duration::from_millis(exponential_delay.min(self.max_delay.as_millis() as f64) as u64);

        if self.jitter {
            let jitter_range = delay.as_millis() as f64 * 0.1;
            if jitter_range >= 1.0 {
                let jitter = rand::thread_rng().gen_range(-jitter_range .. jitter_range);
                delay = Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64);
            }
        }

        delay
    }

    fn delay_for(&self, error: &IntegrationError, attempt: u32) -> Duration {
        match error.retry_after() {
            Some(seconds) => Duration::from_secs(seconds).min(self.max_delay),
            None => self.backoff_delay(attempt),
        }
    }
}

/// Execute an async operation, retrying transient failures.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once `max_retries` is exhausted.
pub async fn execute_with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        retries = attempt,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Upstream call succeeded after retry"
                    );
                }
                return Ok(result);
            },
            Err(error) if attempt < config.max_retries && error.is_retryable() => {
                let delay = config.delay_for(&error, attempt);
                warn!(
                    error = %error,
                    kind = error.kind(),
                    attempt = attempt + 1,
                    max_attempts = config.max_retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Upstream call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            },
            Err(error) => {
                debug!(
                    error = %error,
                    attempts = attempt + 1,
                    elapsed_ms = start_time.elapsed().as_millis() as u64,
                    "Upstream call failed permanently"
                );
                return Err(error);
            },
        }
    }
}
