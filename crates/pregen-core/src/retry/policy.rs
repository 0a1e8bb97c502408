use std::fmt;
use std::time::Duration;

use crate::config::RetryConfig;

/// Why a single load attempt did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Loader resolved the request with `success = false`.
    Failed,
    /// Loader dropped the ticket without resolving it.
    Abandoned,
    /// Request stayed outstanding past the request timeout.
    TimedOut,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Failed => "failed",
            FailureKind::Abandoned => "abandoned",
            FailureKind::TimedOut => "timed out",
        })
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Queue the unit again; it is re-issued ahead of fresh units.
    Retry,
    /// Give up on the unit and count it as skipped.
    Skip,
}

/// Bounded retry with a per-request timeout.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Outstanding requests older than this are treated as failed.
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            request_timeout: Duration::from_secs(cfg.request_timeout_secs),
        }
    }

    /// Decide what to do after `attempt` (1-based) failed.
    pub fn decide(&self, attempt: u32, _kind: FailureKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            RetryDecision::Skip
        } else {
            RetryDecision::Retry
        }
    }

    /// True when a request issued at `issued_at` has been outstanding too long.
    pub fn is_overdue(&self, issued_at: std::time::Instant, now: std::time::Instant) -> bool {
        !self.request_timeout.is_zero() && now.saturating_duration_since(issued_at) >= self.request_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn retries_until_max_attempts_then_skips() {
        let mut p = RetryPolicy::default();
        p.max_attempts = 3;
        assert_eq!(p.decide(1, FailureKind::Failed), RetryDecision::Retry);
        assert_eq!(p.decide(2, FailureKind::TimedOut), RetryDecision::Retry);
        assert_eq!(p.decide(3, FailureKind::Abandoned), RetryDecision::Skip);
    }

    #[test]
    fn zero_attempts_in_config_means_single_attempt() {
        let p = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 0,
            request_timeout_secs: 5,
        });
        assert_eq!(p.max_attempts, 1);
        assert_eq!(p.decide(1, FailureKind::Failed), RetryDecision::Skip);
    }

    #[test]
    fn overdue_respects_timeout_and_zero_disables() {
        let now = Instant::now();
        let p = RetryPolicy {
            max_attempts: 2,
            request_timeout: Duration::from_secs(10),
        };
        assert!(!p.is_overdue(now, now + Duration::from_secs(9)));
        assert!(p.is_overdue(now, now + Duration::from_secs(10)));
        let never = RetryPolicy {
            max_attempts: 2,
            request_timeout: Duration::ZERO,
        };
        assert!(!never.is_overdue(now, now + Duration::from_secs(3600)));
    }
}
