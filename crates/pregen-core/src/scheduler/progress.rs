//! Progress reporting for jobs (units done, ETA, rate).
//!
//! Used by the scheduler for throttled log lines and milestone notifications;
//! consumers can compute rate = units_done / elapsed_secs and
//! ETA = (total_units - units_done - units_skipped) / rate.

use std::time::Duration;

/// Snapshot of generation progress for one job (CLI-friendly).
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    /// Units loaded successfully so far.
    pub units_done: u64,
    /// Units given up on after exhausting retries.
    pub units_skipped: u64,
    /// Exact number of units in the selection.
    pub total_units: u64,
    /// Elapsed time since the job started (seconds).
    pub elapsed_secs: f64,
}

impl ProgressStats {
    /// Load rate in units per second (0 if elapsed is 0).
    pub fn units_per_sec(&self) -> f64 {
        if self.elapsed_secs <= 0.0 {
            return 0.0;
        }
        self.units_done as f64 / self.elapsed_secs
    }

    /// Units neither loaded nor skipped.
    pub fn remaining(&self) -> u64 {
        self.total_units
            .saturating_sub(self.units_done)
            .saturating_sub(self.units_skipped)
    }

    /// Estimated seconds remaining (None if rate is 0, Some(0) when done).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.remaining();
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.units_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    pub fn eta(&self) -> Option<Duration> {
        self.eta_secs().map(Duration::from_secs_f64)
    }

    /// Fraction loaded in [0.0, 1.0].
    pub fn fraction(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        (self.units_done as f64 / self.total_units as f64).min(1.0)
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }
}

/// Compact human duration: `2h 5m 3s`, `1m 30s`, `42s`.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m}m {s}s")
    } else if m > 0 {
        format!("{m}m {s}s")
    } else {
        format!("{s}s")
    }
}
