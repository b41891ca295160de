//! Cool-down policies applied after a failed cycle.

use std::fmt::Debug;
use std::time::Duration;

/// Decides how long the orchestrator waits after a failed cycle before
/// trying again.
pub trait RetryPolicy: Debug + Send + Sync {
    /// Delay before the next attempt. Called once per failed cycle.
    fn next_delay(&mut self) -> Duration;

    /// Forget past failures. Called after a successful cycle.
    fn reset(&mut self);
}

/// Waits the same delay after every failure.
#[derive(Debug, Clone)]
pub struct FixedBackoff {
    delay: Duration,
}

impl FixedBackoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl RetryPolicy for FixedBackoff {
    fn next_delay(&mut self) -> Duration {
        self.delay
    }

    fn reset(&mut self) {}
}

/// Doubles the delay after each consecutive failure, up to `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        let initial_delay = initial_delay.min(max_delay);
        Self {
            initial_delay,
            max_delay,
            current: initial_delay,
        }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = std::cmp::min(self.current.saturating_mul(2), self.max_delay);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial_delay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let mut policy = FixedBackoff::new(Duration::from_secs(10));
        assert_eq!(policy.next_delay(), Duration::from_secs(10));
        assert_eq!(policy.next_delay(), Duration::from_secs(10));
        policy.reset();
        assert_eq!(policy.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_doubles_and_caps() {
        let mut policy = ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(35));

        let delays: Vec<u64> = (0..5).map(|_| policy.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![10, 20, 35, 35, 35]);
    }

    #[test]
    fn test_exponential_backoff_resets_after_success() {
        let mut policy = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60));
        policy.next_delay();
        policy.next_delay();
        policy.reset();
        assert_eq!(policy.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_initial_delay_above_cap_is_clamped() {
        let mut policy = ExponentialBackoff::new(Duration::from_secs(90), Duration::from_secs(30));
        assert_eq!(policy.next_delay(), Duration::from_secs(30));
    }
}
