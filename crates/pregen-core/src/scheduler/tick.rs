//! One scheduler tick: completions, memory guard, batch dispatch, completion.

use std::time::Instant;

use super::{flush_stats, ActiveJob, Scheduler, STATS_FLUSH_INTERVAL};
use crate::job::{JobState, PauseReason};
use crate::notify::{Notification, NotificationHub};
use crate::selection::{Coord, TargetId};
use crate::traversal::Applied;

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Load requests handed to the loader.
    pub issued: usize,
    /// Units confirmed loaded.
    pub loaded: usize,
    /// Units given up on.
    pub skipped: usize,
    /// Completions that matched no outstanding request.
    pub stale: usize,
    pub paused_for_memory: Vec<TargetId>,
    pub resumed_for_memory: Vec<TargetId>,
    /// Jobs that finished (and were removed) this tick.
    pub completed: Vec<TargetId>,
}

impl Scheduler {
    pub fn tick(&mut self) -> TickSummary {
        self.tick_at(Instant::now())
    }

    /// Run one tick as if the current time were `now`.
    pub fn tick_at(&mut self, now: Instant) -> TickSummary {
        let mut summary = TickSummary::default();
        self.apply_completions(now, &mut summary);
        self.guard_memory(now, &mut summary);
        self.dispatch(now, &mut summary);
        for target in summary.completed.clone() {
            self.finish(&target, now);
        }
        summary
    }

    fn apply_completions(&mut self, now: Instant, summary: &mut TickSummary) {
        let milestone_step = self.cfg.notifications.milestone_units;
        for completion in self.completions.drain() {
            let active = match self.jobs.get_mut(&completion.target) {
                Some(a) if a.generation == completion.generation => a,
                _ => {
                    tracing::trace!(
                        target_id = %completion.target,
                        coord = %completion.coord,
                        "dropping completion for a job that is gone"
                    );
                    summary.stale += 1;
                    continue;
                }
            };
            let applied = active
                .generator
                .apply(&completion, &mut active.job, &self.retry);
            note_applied(active, completion.coord, applied, &self.notifier, milestone_step, now, summary);
        }
    }

    fn guard_memory(&mut self, now: Instant, summary: &mut TickSummary) {
        let auto_resume = self.cfg.memory.auto_resume;
        let watching = self.jobs.values().any(|a| {
            a.job.state() == JobState::Running
                || (auto_resume && a.job.pause_reason() == Some(PauseReason::Memory))
        });
        if !watching {
            return;
        }
        let Some(ratio) = self.memory.poll(now) else {
            return;
        };

        if self.memory.is_over(ratio) {
            let pause_all = self.cfg.memory.pause_all;
            for (target, active) in self.jobs.iter_mut() {
                if active.job.state() != JobState::Running {
                    continue;
                }
                flush_stats(self.stats.as_ref(), active, now);
                active.job.set_paused(PauseReason::Memory);
                tracing::warn!(
                    target_id = %target,
                    used_ratio = ratio,
                    "memory usage above threshold, pausing generation"
                );
                summary.paused_for_memory.push(target.clone());
                if !pause_all {
                    break;
                }
            }
            if !summary.paused_for_memory.is_empty() && self.memory.try_alert(now) {
                for target in &summary.paused_for_memory {
                    self.notifier.notify(&Notification::PausedForMemory {
                        target: target.clone(),
                        used_ratio: ratio,
                    });
                }
            }
        } else if auto_resume {
            for (target, active) in self.jobs.iter_mut() {
                if active.job.pause_reason() == Some(PauseReason::Memory) {
                    active.job.set_running();
                    active.last_record = now;
                    tracing::info!(target_id = %target, used_ratio = ratio, "memory recovered, resuming generation");
                    summary.resumed_for_memory.push(target.clone());
                }
            }
        }
    }

    fn dispatch(&mut self, now: Instant, summary: &mut TickSummary) {
        let Scheduler {
            cfg,
            retry,
            jobs,
            completions,
            loader,
            load,
            stats,
            notifier,
            silent,
            quiet_interval,
            ..
        } = self;
        let milestone_step = cfg.notifications.milestone_units;
        let log_progress = !*silent && cfg.logging.console_updates;
        let mut load_sample = None;

        for (target, active) in jobs.iter_mut() {
            if active.job.state() != JobState::Running {
                continue;
            }

            for (coord, applied) in active.generator.expire_overdue(now, &mut active.job, retry) {
                note_applied(active, coord, applied, notifier, milestone_step, now, summary);
            }

            let sample = if active.strategy.needs_load() {
                *load_sample.get_or_insert_with(|| load.current_load())
            } else {
                0.0
            };
            let batch = active.strategy.batch_size(sample) as usize;
            let generation = active.generation;
            summary.issued += active.generator.next_batch(batch, now, |coord, attempt| {
                let ticket = completions.ticket(target, generation, coord, attempt);
                loader.request_load(target, coord, ticket);
            });

            if now.saturating_duration_since(active.last_record) >= STATS_FLUSH_INTERVAL {
                flush_stats(stats.as_ref(), active, now);
            }

            if log_progress && now.saturating_duration_since(active.last_log) >= *quiet_interval {
                active.last_log = now;
                let p = active.job.stats_at(now);
                tracing::info!(
                    target_id = %target,
                    done = p.units_done,
                    total = p.total_units,
                    in_flight = active.generator.outstanding(),
                    "progress {:.2}% | speed {:.2} chunks/s | status {}",
                    p.percent(),
                    p.units_per_sec(),
                    active.job.state().as_str()
                );
            }

            if active.generator.is_complete() {
                summary.completed.push(target.clone());
            }
        }
    }

    fn finish(&mut self, target: &TargetId, now: Instant) {
        let Some(mut active) = self.jobs.remove(target) else {
            return;
        };
        flush_stats(self.stats.as_ref(), &mut active, now);
        active.job.set_terminal(JobState::Completed);
        self.stats.record_job_complete(target);
        if active.strategy.suspends_side_effects() {
            self.host.restore_side_effects(target);
        }

        let p = active.job.stats_at(now);
        let elapsed = now.saturating_duration_since(active.job.started_at());
        tracing::info!(
            target_id = %target,
            done = p.units_done,
            skipped = p.units_skipped,
            "generation completed in {}",
            super::format_duration(elapsed)
        );
        self.notifier.notify(&Notification::Completed {
            target: target.clone(),
            done: p.units_done,
            skipped: p.units_skipped,
            elapsed,
            units_per_sec: p.units_per_sec(),
        });
    }
}

fn note_applied(
    active: &mut ActiveJob,
    coord: Coord,
    applied: Applied,
    notifier: &NotificationHub,
    milestone_step: u64,
    now: Instant,
    summary: &mut TickSummary,
) {
    match applied {
        Applied::Loaded => {
            summary.loaded += 1;
            active.unrecorded += 1;
            if milestone_step > 0 && active.job.current_unit() >= active.next_milestone {
                active.next_milestone += milestone_step;
                let p = active.job.stats_at(now);
                notifier.notify(&Notification::Progress {
                    target: active.job.target().clone(),
                    done: p.units_done,
                    total: p.total_units,
                    percent: p.percent(),
                    eta: p.eta(),
                });
            }
        }
        Applied::Skipped { attempts } => {
            summary.skipped += 1;
            notifier.notify(&Notification::Error {
                target: Some(active.job.target().clone()),
                message: format!("chunk {coord} skipped after {attempts} failed attempt(s)"),
            });
        }
        Applied::Retrying { .. } => {}
        Applied::Stale => summary.stale += 1,
    }
}
