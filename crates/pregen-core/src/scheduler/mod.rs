//! Job scheduler.
//!
//! Owns every active job (at most one per target) and drives them from the
//! host tick: drain load completions, guard memory, then issue each running
//! job's batch. Everything runs on the caller's thread; loaders resolve their
//! tickets from anywhere and the results are picked up on the next tick.

mod guard;
mod progress;
mod tick;

pub use progress::{format_duration, ProgressStats};
pub use tick::TickSummary;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::PregenConfig;
use crate::control::CompletionChannel;
use crate::error::ValidationError;
use crate::host::{ChunkLoader, FastModeEffects, FixedLoad, HostControl, LoadSource, MemorySource, NoHostControl, SystemMemory};
use crate::job::{Job, JobState, Mode, PauseReason};
use crate::notify::{LogNotifier, Notification, NotificationHub};
use crate::rate::RateStrategy;
use crate::retry::RetryPolicy;
use crate::selection::{Selection, TargetId};
use crate::stats::{NoStats, StatsSink};
use crate::traversal::Generator;

use guard::MemoryGuard;

/// Minimum time between two unit-count reports to the stats sink.
const STATS_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Host-side collaborators the scheduler talks to.
pub struct Collaborators {
    pub loader: Arc<dyn ChunkLoader>,
    pub load: Arc<dyn LoadSource>,
    pub memory: Arc<dyn MemorySource>,
    pub stats: Arc<dyn StatsSink>,
    pub notifier: NotificationHub,
    pub host: Arc<dyn HostControl>,
}

impl Collaborators {
    /// Defaults around `loader`: constant full load, OS memory usage, no
    /// statistics, notifications to the log and no host control.
    pub fn new(loader: Arc<dyn ChunkLoader>) -> Self {
        Self {
            loader,
            load: Arc::new(FixedLoad(20.0)),
            memory: Arc::new(SystemMemory::new()),
            stats: Arc::new(NoStats),
            notifier: NotificationHub::new().with_sink(Arc::new(LogNotifier)),
            host: Arc::new(NoHostControl),
        }
    }

    pub fn with_load(mut self, load: Arc<dyn LoadSource>) -> Self {
        self.load = load;
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemorySource>) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_stats(mut self, stats: Arc<dyn StatsSink>) -> Self {
        self.stats = stats;
        self
    }

    pub fn with_notifier(mut self, notifier: NotificationHub) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_host(mut self, host: Arc<dyn HostControl>) -> Self {
        self.host = host;
        self
    }
}

/// Result of [`Scheduler::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { total: u64 },
    /// The target already has a job; nothing was started.
    AlreadyActive,
}

struct ActiveJob {
    job: Job,
    generator: Generator,
    strategy: RateStrategy,
    /// Stamped on every ticket; completions from other generations are stale.
    generation: u64,
    last_log: Instant,
    last_record: Instant,
    unrecorded: u64,
    next_milestone: u64,
}

pub struct Scheduler {
    cfg: PregenConfig,
    retry: RetryPolicy,
    jobs: BTreeMap<TargetId, ActiveJob>,
    completions: CompletionChannel,
    next_generation: u64,
    loader: Arc<dyn ChunkLoader>,
    load: Arc<dyn LoadSource>,
    memory: MemoryGuard,
    stats: Arc<dyn StatsSink>,
    notifier: NotificationHub,
    host: Arc<dyn HostControl>,
    silent: bool,
    quiet_interval: Duration,
}

impl Scheduler {
    pub fn new(cfg: PregenConfig, collab: Collaborators) -> Self {
        let retry = cfg
            .retry
            .as_ref()
            .map(RetryPolicy::from_config)
            .unwrap_or_default();
        Self {
            retry,
            jobs: BTreeMap::new(),
            completions: CompletionChannel::new(),
            next_generation: 0,
            loader: collab.loader,
            load: collab.load,
            memory: MemoryGuard::new(collab.memory, &cfg.memory),
            stats: collab.stats,
            notifier: collab.notifier,
            host: collab.host,
            silent: cfg.logging.silent,
            quiet_interval: Duration::from_secs(cfg.logging.quiet_interval_secs),
            cfg,
        }
    }

    pub fn config(&self) -> &PregenConfig {
        &self.cfg
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Start generating `selection` in `mode`. The target comes from the
    /// selection; if it already has a job nothing changes.
    pub fn start(&mut self, selection: Selection, mode: Mode) -> Result<StartOutcome, ValidationError> {
        let target = selection.validate()?.clone();
        if self.jobs.contains_key(&target) {
            tracing::debug!(target_id = %target, "job already active, not starting another");
            return Ok(StartOutcome::AlreadyActive);
        }

        let now = Instant::now();
        let generator = Generator::prepare(&selection);
        let strategy = RateStrategy::for_mode(mode, &self.cfg);
        tracing::info!(
            target_id = %target,
            %mode,
            shape = %selection.shape,
            pattern = %selection.pattern,
            radius = selection.radius,
            total = generator.total(),
            "starting generation"
        );
        let job = Job::new(target.clone(), selection, mode, generator.sequence(), now);
        let total = job.total();
        self.next_generation += 1;

        if strategy.suspends_side_effects() {
            self.host
                .suspend_side_effects(&target, &FastModeEffects::from(&self.cfg.fast));
        }
        self.stats.record_job_start(&target);
        self.notifier.notify(&Notification::Started {
            target: target.clone(),
            mode,
            total,
        });

        self.jobs.insert(
            target,
            ActiveJob {
                job,
                generator,
                strategy,
                generation: self.next_generation,
                last_log: now,
                last_record: now,
                unrecorded: 0,
                next_milestone: self.cfg.notifications.milestone_units,
            },
        );
        Ok(StartOutcome::Started { total })
    }

    /// Pause a running job. Returns false if there is no running job for `target`.
    pub fn pause(&mut self, target: &TargetId) -> bool {
        let now = Instant::now();
        match self.jobs.get_mut(target) {
            Some(active) if active.job.state() == JobState::Running => {
                flush_stats(self.stats.as_ref(), active, now);
                active.job.set_paused(PauseReason::User);
                tracing::info!(target_id = %target, "generation paused");
                true
            }
            _ => false,
        }
    }

    /// Resume a paused job (whatever paused it). Returns false if there is no
    /// paused job for `target`.
    pub fn resume(&mut self, target: &TargetId) -> bool {
        match self.jobs.get_mut(target) {
            Some(active) if active.job.is_paused() => {
                active.job.set_running();
                active.last_record = Instant::now();
                tracing::info!(target_id = %target, "generation resumed");
                true
            }
            _ => false,
        }
    }

    /// Pause every running job; returns how many were paused.
    pub fn pause_all(&mut self) -> usize {
        let targets = self.active_targets();
        targets.iter().filter(|t| self.pause(t)).count()
    }

    /// Resume every paused job; returns how many were resumed.
    pub fn resume_all(&mut self) -> usize {
        let targets = self.active_targets();
        targets.iter().filter(|t| self.resume(t)).count()
    }

    /// Cancel and remove the job for `target`. Loads still in flight are
    /// ignored when they complete.
    pub fn cancel(&mut self, target: &TargetId) -> bool {
        let Some(mut active) = self.jobs.remove(target) else {
            return false;
        };
        let now = Instant::now();
        flush_stats(self.stats.as_ref(), &mut active, now);
        active.job.set_terminal(JobState::Cancelled);
        self.stats.record_job_cancel(target);
        if active.strategy.suspends_side_effects() {
            self.host.restore_side_effects(target);
        }

        let stats = active.job.stats_at(now);
        tracing::info!(
            target_id = %target,
            done = stats.units_done,
            total = stats.total_units,
            in_flight = active.generator.outstanding(),
            "generation cancelled"
        );
        self.notifier.notify(&Notification::Cancelled {
            target: target.clone(),
            done: stats.units_done,
            total: stats.total_units,
            percent: stats.percent(),
        });
        true
    }

    /// Cancel every job; returns how many were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let targets = self.active_targets();
        targets.iter().filter(|t| self.cancel(t)).count()
    }

    pub fn get_job(&self, target: &TargetId) -> Option<&Job> {
        self.jobs.get(target).map(|a| &a.job)
    }

    pub fn has_active_job(&self, target: &TargetId) -> bool {
        self.jobs.contains_key(target)
    }

    /// Snapshot of every active job, keyed by target.
    pub fn all_jobs(&self) -> HashMap<TargetId, Job> {
        self.jobs
            .iter()
            .map(|(t, a)| (t.clone(), a.job.clone()))
            .collect()
    }

    /// Targets with an active job, in target order.
    pub fn active_targets(&self) -> Vec<TargetId> {
        self.jobs.keys().cloned().collect()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn status(&self, target: &TargetId) -> Option<ProgressStats> {
        self.jobs.get(target).map(|a| a.job.stats())
    }

    /// Loads issued for `target` and not yet resolved.
    pub fn in_flight(&self, target: &TargetId) -> usize {
        self.jobs
            .get(target)
            .map(|a| a.generator.outstanding())
            .unwrap_or(0)
    }

    /// Flip periodic progress logging; returns the new silent flag.
    pub fn toggle_silent(&mut self) -> bool {
        self.silent = !self.silent;
        self.silent
    }

    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    pub fn is_silent(&self) -> bool {
        self.silent
    }

    pub fn set_quiet_interval(&mut self, interval: Duration) {
        self.quiet_interval = interval;
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet_interval
    }
}

/// Report units loaded since the last flush and restart the measuring window.
fn flush_stats(stats: &dyn StatsSink, active: &mut ActiveJob, now: Instant) {
    if active.unrecorded > 0 {
        stats.record_units(
            active.job.target(),
            active.unrecorded,
            now.saturating_duration_since(active.last_record),
        );
        active.unrecorded = 0;
    }
    active.last_record = now;
}
