use std::thread;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Bounds an optimistic retry loop.
///
/// The default never gives up and never sleeps: a loop retries immediately
/// until its guarded write lands.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first. `None` is unbounded.
    pub max_attempts: Option<u32>,
    /// Delay before the first retry, doubled on each further retry.
    pub base_delay_ms: u64,
    /// Upper bound on the delay between two attempts.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Retry forever without sleeping.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Give up after `max_attempts` attempts.
    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts),
            ..Self::default()
        }
    }

    /// Sleep with exponential backoff between attempts.
    pub fn with_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms.max(base_delay_ms);
        self
    }

    /// Begin a retry loop for `operation`.
    pub fn start(&self, operation: &'static str) -> Retry<'_> {
        Retry {
            policy: self,
            operation,
            attempts: 0,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    ///
    /// Exponential in `attempt`, capped at `max_delay_ms`, plus up to a
    /// quarter of jitter so contending writers drift apart.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if self.base_delay_ms == 0 {
            return Duration::ZERO;
        }
        let exp = 1u64 << attempt.saturating_sub(1).min(16);
        let delay = self
            .base_delay_ms
            .saturating_mul(exp)
            .min(self.max_delay_ms.max(self.base_delay_ms));
        let jitter = rand::thread_rng().gen_range(0..=delay / 4);
        Duration::from_millis(delay.saturating_add(jitter))
    }
}

/// State of one running retry loop.
#[derive(Debug)]
pub struct Retry<'a> {
    policy: &'a RetryPolicy,
    operation: &'static str,
    attempts: u32,
}

impl Retry<'_> {
    /// Record a failed attempt. Sleeps for the backoff delay, or returns
    /// [`StoreError::RetryBudgetExhausted`] once the budget is used up.
    pub fn next_attempt(&mut self) -> StoreResult<()> {
        self.attempts = self.attempts.saturating_add(1);
        if let Some(max) = self.policy.max_attempts {
            if self.attempts >= max {
                return Err(StoreError::RetryBudgetExhausted {
                    operation: self.operation,
                    attempts: self.attempts,
                });
            }
        }
        let delay = self.policy.backoff(self.attempts);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        Ok(())
    }

    /// Failed attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded_without_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, None);
        let mut retry = policy.start("put");
        for _ in 0..1000 {
            retry.next_attempt().unwrap();
        }
        assert_eq!(retry.attempts(), 1000);
        assert_eq!(policy.backoff(5), Duration::ZERO);
    }

    #[test]
    fn bounded_policy_exhausts() {
        let policy = RetryPolicy::bounded(3);
        let mut retry = policy.start("mutate");
        retry.next_attempt().unwrap();
        retry.next_attempt().unwrap();
        let err = retry.next_attempt().unwrap_err();
        assert!(matches!(
            err,
            StoreError::RetryBudgetExhausted {
                operation: "mutate",
                attempts: 3
            }
        ));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::unbounded().with_backoff(10, 100);
        let first = policy.backoff(1).as_millis() as u64;
        assert!((10..=12).contains(&first));
        let third = policy.backoff(3).as_millis() as u64;
        assert!((40..=50).contains(&third));
        let capped = policy.backoff(30).as_millis() as u64;
        assert!((100..=125).contains(&capped));
    }
}
