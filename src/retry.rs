//! Retry budget and exponential backoff for transient failures.
//!
//! A request is sent once. If that attempt fails at the transport level, or
//! the server answers with a 5xx status, up to [`RetryPolicy::retry_count`]
//! further attempts are made. The first retry is immediate; retry `i`
//! (0-indexed) after that waits `2^i * backoff_unit`.

use std::time::Duration;

/// Default unit multiplied by `2^attempt` between retries.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Defines how many times, and how patiently, a failed request is re-sent.
///
/// # Examples
///
/// ```
/// use restree::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3);
///
/// // First retry is immediate, then 2s, 4s...
/// assert_eq!(policy.delay_for_retry(0), None);
/// assert_eq!(policy.delay_for_retry(1), Some(Duration::from_secs(2)));
/// assert_eq!(policy.delay_for_retry(2), Some(Duration::from_secs(4)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: usize,
    backoff_unit: Duration,
}

impl RetryPolicy {
    /// Creates a policy allowing `retry_count` attempts after the first failure.
    pub fn new(retry_count: usize) -> Self {
        Self {
            retry_count,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    /// Sets the unit multiplied by `2^attempt` between retries.
    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Returns the number of additional attempts after the first failure.
    pub fn retry_count(&self) -> usize {
        self.retry_count
    }

    /// Returns the backoff unit.
    pub fn backoff_unit(&self) -> Duration {
        self.backoff_unit
    }

    /// Returns the delay to wait before retry `retry` (0-indexed).
    ///
    /// `None` means the retry is sent immediately.
    pub fn delay_for_retry(&self, retry: usize) -> Option<Duration> {
        if retry == 0 {
            return None;
        }
        let multiplier = 2u32.saturating_pow(u32::try_from(retry).unwrap_or(u32::MAX));
        Some(self.backoff_unit.saturating_mul(multiplier))
    }

    /// Returns `true` once an attempt outcome no longer warrants a retry.
    ///
    /// `status` is `None` when the transport failed.
    pub fn is_settled(status: Option<http::StatusCode>) -> bool {
        matches!(status, Some(status) if !status.is_server_error())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0)
    }
}
