//! Retry strategies for tile retrieval.

use std::fmt;
use std::time::Duration;

/// Decides whether, and after how long, a failed tile is attempted again.
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Delay before the next attempt after `failures` consecutive failed
    /// attempts (always at least 1), or `None` to abandon the tile.
    fn next_delay(&self, failures: u32) -> Option<Duration>;
}

/// Retry every failure, without limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryForever {
    delay: Duration,
}

impl RetryForever {
    /// Retry after a fixed `delay` (zero retries immediately).
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay }
    }
}

impl RetryPolicy for RetryForever {
    fn next_delay(&self, _failures: u32) -> Option<Duration> {
        Some(self.delay)
    }
}

/// Give up after a total number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedRetry {
    max_attempts: u32,
    delay: Duration,
}

impl BoundedRetry {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl RetryPolicy for BoundedRetry {
    fn next_delay(&self, failures: u32) -> Option<Duration> {
        (failures < self.max_attempts).then_some(self.delay)
    }
}

/// Single attempt per tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _failures: u32) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_forever_never_gives_up() {
        let policy = RetryForever::default();
        assert_eq!(policy.next_delay(1), Some(Duration::ZERO));
        assert_eq!(policy.next_delay(u32::MAX), Some(Duration::ZERO));

        let policy = RetryForever::with_delay(Duration::from_millis(50));
        assert_eq!(policy.next_delay(3), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_bounded_retry_counts_attempts() {
        let policy = BoundedRetry::new(3, Duration::ZERO);
        assert!(policy.next_delay(1).is_some());
        assert!(policy.next_delay(2).is_some());
        assert!(policy.next_delay(3).is_none());
    }

    #[test]
    fn test_no_retry() {
        assert!(NoRetry.next_delay(1).is_none());
    }
}
