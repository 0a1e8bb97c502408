//! Engine: scheduler plus job queue behind one command surface.
//!
//! Host integrations call [`Engine::tick`] once per host tick and map their
//! commands onto the methods below.

use std::time::Instant;

use crate::config::PregenConfig;
use crate::error::ValidationError;
use crate::job::{Job, Mode};
use crate::queue::{JobQueue, QueuedJob};
use crate::scheduler::{Collaborators, ProgressStats, Scheduler, StartOutcome, TickSummary};
use crate::selection::{Selection, TargetId};

pub struct Engine {
    scheduler: Scheduler,
    queue: JobQueue,
    ticks: u64,
    monitor_interval: u64,
}

impl Engine {
    pub fn new(cfg: PregenConfig, collab: Collaborators) -> Self {
        let monitor_interval = u64::from(cfg.queue.monitor_interval_ticks.max(1));
        Self {
            scheduler: Scheduler::new(cfg, collab),
            queue: JobQueue::new(),
            ticks: 0,
            monitor_interval,
        }
    }

    pub fn tick(&mut self) -> TickSummary {
        self.tick_at(Instant::now())
    }

    /// Scheduler tick, then the queue monitor every `monitor_interval_ticks`.
    pub fn tick_at(&mut self, now: Instant) -> TickSummary {
        let summary = self.scheduler.tick_at(now);
        self.ticks += 1;
        if self.ticks % self.monitor_interval == 0 {
            self.queue.poll(&mut self.scheduler);
        }
        summary
    }

    pub fn start(&mut self, selection: Selection, mode: Mode) -> Result<StartOutcome, ValidationError> {
        self.scheduler.start(selection, mode)
    }

    pub fn pause(&mut self, target: &TargetId) -> bool {
        self.scheduler.pause(target)
    }

    pub fn resume(&mut self, target: &TargetId) -> bool {
        self.scheduler.resume(target)
    }

    pub fn cancel(&mut self, target: &TargetId) -> bool {
        self.scheduler.cancel(target)
    }

    pub fn status(&self, target: &TargetId) -> Option<ProgressStats> {
        self.scheduler.status(target)
    }

    pub fn job(&self, target: &TargetId) -> Option<&Job> {
        self.scheduler.get_job(target)
    }

    pub fn enqueue(&mut self, selection: Selection, mode: Mode, priority: i32) -> Result<(), ValidationError> {
        self.queue.enqueue(&mut self.scheduler, selection, mode, priority)
    }

    /// Remove the pending queue entry at `index`; out of range is a no-op.
    pub fn dequeue(&mut self, index: usize) -> Option<QueuedJob> {
        self.queue.remove_at(index)
    }

    pub fn list_queue(&self) -> Vec<QueuedJob> {
        self.queue.list()
    }

    /// Empty the queue and cancel the job it is executing.
    pub fn cancel_queue(&mut self) {
        self.queue.cancel_all(&mut self.scheduler)
    }

    /// Nothing running and nothing waiting.
    pub fn is_idle(&self) -> bool {
        self.scheduler.job_count() == 0 && self.queue.is_empty() && !self.queue.is_processing()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }
}
