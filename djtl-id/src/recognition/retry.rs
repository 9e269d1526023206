//! Exponential backoff with jitter around recognition calls
//!
//! **Backoff Strategy:**
//! - delay(n) = min(initial_delay · 2ⁿ, max_delay)
//! - ± `jitter` fraction of uniform noise
//! - never below `min_delay`
//! - at most `max_retries` retries after the first attempt
//!
//! Only errors that report [`RecognitionError::is_retryable`] are retried.

use super::{Recognition, RecognitionError, Recognizer};
use crate::models::Segment;
use async_trait::async_trait;
use djtl_common::config::RecognitionSection;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Upper bound for configured retry delays, in seconds
pub const MAX_RETRY_DELAY_SECS: f64 = 3600.0;

/// Configured seconds as a delay; out-of-range values are clamped, NaN is zero
fn delay_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.clamp(0.0, MAX_RETRY_DELAY_SECS)).unwrap_or(Duration::ZERO)
}

/// Retry parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay added or removed at random (0.2 = ±20%)
    pub jitter: f64,
    /// Floor applied after jitter
    pub min_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            jitter: 0.2,
            min_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn from_section(section: &RecognitionSection) -> Self {
        Self {
            max_retries: section.max_retries,
            initial_delay: delay_from_secs(section.initial_delay_secs),
            max_delay: delay_from_secs(section.max_delay_secs),
            jitter: section.jitter.clamp(0.0, 1.0),
            ..Self::default()
        }
    }

    /// No retries at all
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry `retry` (0-based), before jitter
    pub fn base_delay(&self, retry: u32) -> Duration {
        let exp = self.initial_delay.as_secs_f64() * 2f64.powi(retry.min(62) as i32);
        Duration::from_secs_f64(exp.min(self.max_delay.as_secs_f64()))
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            policy: *self,
            retries: 0,
        }
    }
}

/// Stateful delay sequence for one operation
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: RetryPolicy,
    retries: u32,
}

impl Backoff {
    /// Next delay, or `None` once `max_retries` is used up
    pub fn next_delay(&mut self) -> Option<Duration> {
        let mut rng = rand::thread_rng();
        self.next_delay_with(&mut rng)
    }

    pub fn next_delay_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Duration> {
        if self.retries >= self.policy.max_retries {
            return None;
        }

        let base = self.policy.base_delay(self.retries).as_secs_f64();
        let jitter = self.policy.jitter;
        let noise = if jitter > 0.0 {
            rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        let delay = (base * (1.0 + noise)).max(self.policy.min_delay.as_secs_f64());

        self.retries += 1;
        Some(Duration::from_secs_f64(delay))
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn reset(&mut self) {
        self.retries = 0;
    }
}

/// Run `op` until it succeeds, fails non-retryably, or retries run out
pub async fn retry_with_backoff<F, Fut, T>(
    operation: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RecognitionError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RecognitionError>>,
{
    let mut backoff = policy.backoff();
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => match backoff.next_delay() {
                Some(delay) => {
                    tracing::warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, will retry after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    tracing::warn!(operation, attempt, error = %err, "Retries exhausted");
                    return Err(err);
                }
            },
        }
    }
}

/// Decorator adding retry to any recognizer
pub struct Retrying<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R: Recognizer> Retrying<R> {
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<R: Recognizer> Recognizer for Retrying<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn recognize(&self, segment: &Segment) -> Result<Recognition, RecognitionError> {
        retry_with_backoff(self.inner.name(), &self.policy, || {
            self.inner.recognize(segment)
        })
        .await
    }
}
