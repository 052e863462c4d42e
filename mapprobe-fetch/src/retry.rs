//! Bounded retries with a fixed interval.
//!
//! The probe retries in exactly two places: import status polling and the
//! repeated download-status updates. Both are "call up to N times, wait a
//! fixed interval between calls", so both use [`RetryPolicy::run`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use mapprobe_core::Sleeper;

/// Attempts made while polling import status.
pub const STATUS_POLL_MAX_ATTEMPTS: u32 = 30;

/// Interval between import status polls.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(2);

// ============================================================================
// Attempt / Outcome
// ============================================================================

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// Stop with this value.
    Done(T),
    /// Try again if the budget allows.
    Retry,
}

/// Terminal result of a retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    /// An attempt finished the loop.
    Done {
        /// Value produced by the final attempt.
        value: T,
        /// Attempts made, including the final one.
        attempts: u32,
    },
    /// Every attempt asked for a retry.
    Exhausted {
        /// Attempts made.
        attempts: u32,
    },
}

impl<T> RetryOutcome<T> {
    /// Number of attempts made.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Done { attempts, .. } | Self::Exhausted { attempts } => *attempts,
        }
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// Fixed-interval bounded retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts.
    pub max_attempts: u32,
    /// Wait between consecutive attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// Creates a new policy.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// The import status polling policy: 30 attempts, 2 seconds apart.
    pub fn status_poll() -> Self {
        Self::new(STATUS_POLL_MAX_ATTEMPTS, STATUS_POLL_INTERVAL)
    }

    /// Runs `attempt` until it returns [`Attempt::Done`] or the budget is
    /// spent.
    ///
    /// `attempt` receives the 1-based attempt number. The sleeper is called
    /// between attempts only, so `n` attempts mean `n - 1` sleeps.
    pub async fn run<T, F, Fut>(&self, sleeper: &dyn Sleeper, mut attempt: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        for n in 1..=self.max_attempts {
            if let Attempt::Done(value) = attempt(n).await {
                return RetryOutcome::Done { value, attempts: n };
            }
            if n < self.max_attempts {
                sleeper.sleep(self.interval).await;
            }
        }

        RetryOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }

    /// Runs `action` exactly `max_attempts` times with the interval between
    /// runs. Returns the number of runs.
    pub async fn repeat<F, Fut>(&self, sleeper: &dyn Sleeper, mut action: F) -> u32
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = ()>,
    {
        let outcome: RetryOutcome<()> = self
            .run(sleeper, |n| {
                let fut = action(n);
                async move {
                    fut.await;
                    Attempt::Retry
                }
            })
            .await;
        outcome.attempts()
    }
}

// ============================================================================
// Sleepers
// ============================================================================

/// Sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately and remembers every requested wait.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingSleeper {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(duration);
    }
}

// ============================================================================
// Tests
// ============================================================================
