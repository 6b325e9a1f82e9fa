//! Bounded retry for handler code
//!
//! The dispatcher never retries. Handlers that talk to flaky backends wrap
//! their calls in [`retry_with`] and decide per error whether another attempt
//! is worth it.

use std::time::Duration;

use tracing::warn;

use crate::error::{TesseraError, TesseraResult};
use crate::settings::RetrySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one; no delay between attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts).with_delay(settings.delay())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry,
    Stop,
}

/// Retry backend conditions flagged transient, stop on everything else.
pub fn transient_only(error: &TesseraError) -> RetryDecision {
    if error.is_transient() {
        RetryDecision::Retry
    } else {
        RetryDecision::Stop
    }
}

/// Run `op` until it succeeds, `classify` says stop, or attempts run out.
///
/// `op` receives the 1-based attempt number. A stopped error is returned
/// unchanged; running out yields [`TesseraError::RetriesExhausted`].
pub fn retry_with<T, C, F>(policy: &RetryPolicy, classify: C, mut op: F) -> TesseraResult<T>
where
    C: Fn(&TesseraError) -> RetryDecision,
    F: FnMut(u32) -> TesseraResult<T>,
{
    let mut attempt = 1;
    loop {
        let error = match op(attempt) {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if classify(&error) == RetryDecision::Stop {
            return Err(error);
        }
        if attempt >= policy.max_attempts {
            return Err(TesseraError::RetriesExhausted {
                attempts: attempt,
                last: Box::new(error),
            });
        }

        warn!(
            attempt,
            max_attempts = policy.max_attempts,
            error = %error,
            "transient failure, retrying"
        );
        if !policy.delay.is_zero() {
            std::thread::sleep(policy.delay);
        }
        attempt += 1;
    }
}
