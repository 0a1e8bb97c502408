//! Per-target generation statistics.
//!
//! The scheduler reports into a [`StatsSink`] fire-and-forget. The bundled
//! [`StatisticsStore`] keeps running totals in memory and can persist them as
//! JSON under the XDG state dir so totals survive restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::scheduler::format_duration;
use crate::selection::TargetId;

/// Receiver of scheduler statistics. Implementations handle their own failures.
pub trait StatsSink: Send + Sync {
    /// `count` units were loaded over `elapsed` of active generation time.
    fn record_units(&self, target: &TargetId, count: u64, elapsed: Duration);
    fn record_job_start(&self, target: &TargetId);
    fn record_job_complete(&self, target: &TargetId);
    fn record_job_cancel(&self, target: &TargetId);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStats;

impl StatsSink for NoStats {
    fn record_units(&self, _target: &TargetId, _count: u64, _elapsed: Duration) {}
    fn record_job_start(&self, _target: &TargetId) {}
    fn record_job_complete(&self, _target: &TargetId) {}
    fn record_job_cancel(&self, _target: &TargetId) {}
}

/// Running totals for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetStats {
    pub total_units: u64,
    pub total_time_ms: u64,
    pub sessions: u32,
    pub completed_jobs: u32,
    pub cancelled_jobs: u32,
    /// Units per second over all recorded time.
    pub average_speed: f64,
    /// Best units per second seen in a single recording.
    pub peak_speed: f64,
    #[serde(default)]
    pub last_generation_unix: Option<u64>,
}

/// JSON snapshot written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedStatistics {
    #[serde(default = "default_version")]
    pub version: u8,
    pub targets: HashMap<String, TargetStats>,
}

fn default_version() -> u8 {
    1
}

/// In-memory statistics with optional JSON persistence.
#[derive(Debug, Default)]
pub struct StatisticsStore {
    targets: Mutex<HashMap<String, TargetStats>>,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default path for the statistics file: `~/.local/state/pregen/statistics.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("pregen")?;
        Ok(xdg_dirs.get_state_home().join("pregen").join("statistics.json"))
    }

    fn with_target<F: FnOnce(&mut TargetStats)>(&self, target: &TargetId, f: F) {
        let mut targets = match self.targets.lock() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(targets.entry(target.as_str().to_string()).or_default());
    }

    pub fn get(&self, target: &TargetId) -> TargetStats {
        self.snapshot()
            .targets
            .remove(target.as_str())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> PersistedStatistics {
        let targets = match self.targets.lock() {
            Ok(t) => t.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        PersistedStatistics {
            version: 1,
            targets,
        }
    }

    pub fn from_snapshot(snapshot: PersistedStatistics) -> Self {
        Self {
            targets: Mutex::new(snapshot.targets),
        }
    }

    /// Save current totals to the given path (creates parent dir if needed).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&snapshot).context("serialize statistics")?;
        std::fs::write(path, json)
            .with_context(|| format!("write statistics: {}", path.display()))?;
        Ok(())
    }

    /// Load totals from the given path. A missing file yields `None`.
    pub fn load_from_path(path: &Path) -> Result<Option<StatisticsStore>> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("read statistics: {}", path.display()))
            }
        };
        let snapshot: PersistedStatistics = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse statistics: {}", path.display()))?;
        Ok(Some(StatisticsStore::from_snapshot(snapshot)))
    }

    /// Load from `path`, falling back to an empty store (with a warning) on any error.
    pub fn load_or_empty(path: &Path) -> StatisticsStore {
        match StatisticsStore::load_from_path(path) {
            Ok(Some(store)) => store,
            Ok(None) => StatisticsStore::new(),
            Err(e) => {
                tracing::warn!("failed to load statistics: {:#}", e);
                StatisticsStore::new()
            }
        }
    }

    /// Save to `path`, logging instead of failing.
    pub fn save_or_warn(&self, path: &Path) {
        if let Err(e) = self.save_to_path(path) {
            tracing::warn!("failed to save statistics: {:#}", e);
        }
    }

    /// Plain-text report for one target.
    pub fn report(&self, target: &TargetId) -> String {
        let s = self.get(target);
        let mut out = format!("statistics for '{}'\n", target);
        out.push_str(&format!("  chunks generated: {}\n", s.total_units));
        out.push_str(&format!(
            "  time spent:       {}\n",
            format_duration(Duration::from_millis(s.total_time_ms))
        ));
        out.push_str(&format!("  sessions:         {}\n", s.sessions));
        out.push_str(&format!("  completed:        {}\n", s.completed_jobs));
        out.push_str(&format!("  cancelled:        {}\n", s.cancelled_jobs));
        out.push_str(&format!("  average speed:    {:.2} chunks/s\n", s.average_speed));
        out.push_str(&format!("  peak speed:       {:.2} chunks/s\n", s.peak_speed));
        if let Some(ts) = s.last_generation_unix {
            out.push_str(&format!("  last generation:  {} (unix)\n", ts));
        }
        out
    }
}

fn unix_now() -> Option<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs())
}

impl StatsSink for StatisticsStore {
    fn record_units(&self, target: &TargetId, count: u64, elapsed: Duration) {
        if count == 0 {
            return;
        }
        self.with_target(target, |s| {
            s.total_units = s.total_units.saturating_add(count);
            s.total_time_ms = s.total_time_ms.saturating_add(elapsed.as_millis() as u64);
            s.last_generation_unix = unix_now();
            let secs = elapsed.as_secs_f64();
            if secs > 0.0 {
                s.peak_speed = s.peak_speed.max(count as f64 / secs);
            }
            if s.total_time_ms > 0 {
                s.average_speed = s.total_units as f64 / (s.total_time_ms as f64 / 1000.0);
            }
        });
    }

    fn record_job_start(&self, target: &TargetId) {
        self.with_target(target, |s| s.sessions = s.sessions.saturating_add(1));
    }

    fn record_job_complete(&self, target: &TargetId) {
        self.with_target(target, |s| {
            s.completed_jobs = s.completed_jobs.saturating_add(1)
        });
    }

    fn record_job_cancel(&self, target: &TargetId) {
        self.with_target(target, |s| {
            s.cancelled_jobs = s.cancelled_jobs.saturating_add(1)
        });
    }
}
