//! Bounded-retry executor with pluggable backoff.
//!
//! Every network-calling step in the engine goes through [`retry`]. The
//! default policy sleeps a linearly growing delay between attempts; the
//! summarization model call uses a jittered multi-minute backoff to avoid
//! hammering a rate-limited endpoint in lockstep with other workspaces.

use std::fmt;
use std::time::Duration;

use rand::Rng;

/// Classifies whether a failed operation is worth re-attempting in place.
///
/// Errors that represent a terminal outcome for the current input (for
/// example [`crate::error::ModelError::EmptySummaries`]) return `false` and
/// escape the retry loop immediately so the caller can change the input
/// instead of repeating it.
pub trait Retryable {
    fn is_transient(&self) -> bool {
        true
    }
}

impl Retryable for crate::error::SlackError {}

impl Retryable for crate::error::ModelError {
    fn is_transient(&self) -> bool {
        !matches!(self, crate::error::ModelError::EmptySummaries)
    }
}

/// Delay schedule between attempts.
#[derive(Debug, Clone)]
pub enum Backoff {
    /// `step * attempt` after the attempt-th failure.
    Linear { step: Duration },
    /// Uniformly random `1..=(attempt + 1)` multiples of `unit`.
    Jittered { unit: Duration },
}

impl Backoff {
    /// Delay to wait after the given 1-based failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Linear { step } => step.saturating_mul(attempt),
            Backoff::Jittered { unit } => {
                let multiplier = rand::thread_rng().gen_range(1..=attempt.saturating_add(1));
                unit.saturating_mul(multiplier)
            }
        }
    }
}

/// Retry policy: attempt budget plus backoff schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Linear backoff starting at one second: 1s, 2s, 3s, ...
    pub fn linear(attempts: u32) -> Self {
        Self {
            attempts,
            backoff: Backoff::Linear {
                step: Duration::from_millis(1000),
            },
        }
    }

    /// Jittered backoff in multiples of `unit` (one minute in production).
    pub fn jittered(attempts: u32, unit: Duration) -> Self {
        Self {
            attempts,
            backoff: Backoff::Jittered { unit },
        }
    }

    /// Replace the backoff step, keeping the attempt budget. Used by tests
    /// to shrink delays to the millisecond scale.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }
}

/// Invoke `op` until it succeeds, it fails with a non-transient error, or
/// the attempt budget is exhausted. Returns the last error on exhaustion.
///
/// A successful-but-empty result is not this function's concern: callers
/// that consider empty output a failure must surface it as an error first.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < attempts => {
                let delay = policy.backoff.delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Attempt failed, will retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::debug!(attempt, error = %e, "Giving up");
                return Err(e);
            }
        }
    }
}
