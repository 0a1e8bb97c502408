//! Job model: mode, lifecycle state and the mutable execution record.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scheduler::ProgressStats;
use crate::selection::{Coord, Selection, TargetId};

/// Throughput mode, chosen when a job starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Fixed throughput.
    #[default]
    Normal,
    /// Closed-loop adaptive to host load.
    Pro,
    /// Maximum throughput; asks the host to suspend non-essential work.
    Fast,
}

impl FromStr for Mode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "pro" => Ok(Mode::Pro),
            "fast" => Ok(Mode::Fast),
            _ => Err(ValidationError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Normal => "NORMAL",
            Mode::Pro => "PRO",
            Mode::Fast => "FAST",
        })
    }
}

/// Lifecycle state. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Paused,
    Cancelled,
    Completed,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Cancelled => "cancelled",
            JobState::Completed => "completed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Cancelled | JobState::Completed)
    }
}

/// Why a job is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    User,
    Memory,
}

/// Execution record for one target.
#[derive(Debug, Clone)]
pub struct Job {
    target: TargetId,
    selection: Selection,
    mode: Mode,
    state: JobState,
    pause_reason: Option<PauseReason>,
    started_at: Instant,
    total: u64,
    current_unit: u64,
    skipped: u64,
    processed: HashSet<Coord>,
    remaining: HashSet<Coord>,
}

impl Job {
    /// New running job over `sequence`; its length is the authoritative total.
    pub(crate) fn new(
        target: TargetId,
        selection: Selection,
        mode: Mode,
        sequence: &[Coord],
        started_at: Instant,
    ) -> Self {
        Self {
            target,
            selection,
            mode,
            state: JobState::Running,
            pause_reason: None,
            started_at,
            total: sequence.len() as u64,
            current_unit: 0,
            skipped: 0,
            processed: HashSet::with_capacity(sequence.len()),
            remaining: sequence.iter().copied().collect(),
        }
    }

    pub fn target(&self) -> &TargetId {
        &self.target
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == JobState::Paused
    }

    pub fn pause_reason(&self) -> Option<PauseReason> {
        self.pause_reason
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Exact number of units enumerated for the selection.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Units loaded successfully so far.
    pub fn current_unit(&self) -> u64 {
        self.current_unit
    }

    /// Units given up on after exhausting retries.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn processed(&self) -> &HashSet<Coord> {
        &self.processed
    }

    pub fn remaining(&self) -> &HashSet<Coord> {
        &self.remaining
    }

    /// Percentage of units loaded, 0 when the total is 0.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.current_unit as f64 / self.total as f64 * 100.0
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Progress snapshot measured at `now`.
    pub fn stats_at(&self, now: Instant) -> ProgressStats {
        ProgressStats {
            units_done: self.current_unit,
            units_skipped: self.skipped,
            total_units: self.total,
            elapsed_secs: now.saturating_duration_since(self.started_at).as_secs_f64(),
        }
    }

    pub fn stats(&self) -> ProgressStats {
        self.stats_at(Instant::now())
    }

    pub(crate) fn set_running(&mut self) {
        self.state = JobState::Running;
        self.pause_reason = None;
    }

    pub(crate) fn set_paused(&mut self, reason: PauseReason) {
        self.state = JobState::Paused;
        self.pause_reason = Some(reason);
    }

    pub(crate) fn set_terminal(&mut self, state: JobState) {
        debug_assert!(state.is_terminal());
        self.state = state;
        self.pause_reason = None;
    }

    /// Record a successful load. Returns false if the unit was not pending.
    pub(crate) fn mark_processed(&mut self, coord: Coord) -> bool {
        if !self.remaining.remove(&coord) {
            return false;
        }
        self.processed.insert(coord);
        self.current_unit += 1;
        true
    }

    /// Record a unit given up on. Returns false if the unit was not pending.
    pub(crate) fn mark_skipped(&mut self, coord: Coord) -> bool {
        if !self.remaining.remove(&coord) {
            return false;
        }
        self.skipped += 1;
        true
    }
}
