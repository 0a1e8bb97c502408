//! Memory guard: rate-limited memory sampling and alert cooldown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::MemoryConfig;
use crate::host::MemorySource;

/// Samples host memory at most once per check interval.
pub(super) struct MemoryGuard {
    source: Arc<dyn MemorySource>,
    threshold: f64,
    check_interval: Duration,
    alert_cooldown: Duration,
    last_check: Option<Instant>,
    last_alert: Option<Instant>,
}

impl MemoryGuard {
    pub(super) fn new(source: Arc<dyn MemorySource>, cfg: &MemoryConfig) -> Self {
        Self {
            source,
            threshold: cfg.threshold,
            check_interval: cfg.check_interval(),
            alert_cooldown: cfg.alert_cooldown(),
            last_check: None,
            last_alert: None,
        }
    }

    /// Fresh usage ratio if the check interval has elapsed since the last sample.
    /// The first call always samples.
    pub(super) fn poll(&mut self, now: Instant) -> Option<f64> {
        if let Some(last) = self.last_check {
            if now.saturating_duration_since(last) < self.check_interval {
                return None;
            }
        }
        self.last_check = Some(now);
        Some(self.source.used_ratio())
    }

    pub(super) fn is_over(&self, ratio: f64) -> bool {
        ratio > self.threshold
    }

    /// True (and arms the cooldown) when an alert may be raised now.
    pub(super) fn try_alert(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_alert {
            if now.saturating_duration_since(last) < self.alert_cooldown {
                return false;
            }
        }
        self.last_alert = Some(now);
        true
    }
}
