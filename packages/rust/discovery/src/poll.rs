//! Bounded polling with an injectable clock.
//!
//! The SPA renders asynchronously, so reads are retried at a fixed interval
//! a bounded number of times. Exhaustion is an outcome, not an error.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

/// Source of delays. Tests swap in a clock that records instead of sleeping.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `tokio::time`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-interval retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Longest time a full poll can wait.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// Step through this budget by hand.
    pub fn attempts(self, clock: &dyn Clock) -> Attempts<'_> {
        Attempts {
            policy: self,
            clock,
            made: 0,
        }
    }
}

/// A [`RetryPolicy`] being spent, one interval at a time.
///
/// For loops whose probe borrows the caller mutably and so cannot be handed
/// to [`poll_until`] as a closure.
pub struct Attempts<'a> {
    policy: RetryPolicy,
    clock: &'a dyn Clock,
    made: u32,
}

impl Attempts<'_> {
    /// Sleep one interval and return the 1-based attempt number, or `None`
    /// once the budget is spent (without sleeping).
    pub async fn tick(&mut self) -> Option<u32> {
        if self.made >= self.policy.max_attempts {
            return None;
        }
        self.clock.sleep(self.policy.interval).await;
        self.made += 1;
        Some(self.made)
    }
}

/// Result of [`poll_until`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// A probe value was accepted on attempt `attempts` (1-based).
    Ready { value: T, attempts: u32 },
    /// Every attempt was rejected; `last` is the final probe value.
    Exhausted { last: Option<T>, attempts: u32 },
}

impl<T> PollOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// The accepted value, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready { value, .. } => Some(value),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Sleep `policy.interval`, probe, and stop at the first value `accept`
/// approves. Gives up after `policy.max_attempts` probes.
pub async fn poll_until<T, F, A>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    mut probe: F,
    mut accept: A,
) -> PollOutcome<T>
where
    F: AsyncFnMut() -> T,
    A: FnMut(&T) -> bool,
{
    let mut attempts = policy.attempts(clock);
    let mut last = None;

    while let Some(attempt) = attempts.tick().await {
        let value = probe().await;
        if accept(&value) {
            return PollOutcome::Ready {
                value,
                attempts: attempt,
            };
        }
        debug!(attempt, max = policy.max_attempts, "poll attempt rejected");
        last = Some(value);
    }

    PollOutcome::Exhausted {
        last,
        attempts: policy.max_attempts,
    }
}
