//! Priority queue of pending jobs.
//!
//! At most one queue-controlled job executes at a time. Entries are ordered
//! by priority (higher first), then by submission order. `poll` is the queue
//! monitor: it runs on the tick cadence and starts the next entry once the
//! current job has left the scheduler.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use crate::error::ValidationError;
use crate::job::Mode;
use crate::scheduler::{Scheduler, StartOutcome};
use crate::selection::{Selection, TargetId};

/// A pending (or the currently executing) queue entry.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    target: TargetId,
    pub selection: Selection,
    pub mode: Mode,
    pub priority: i32,
    pub enqueued_at: Instant,
    seq: u64,
    /// False while the entry waits for an unrelated job on the same target.
    started: bool,
}

impl QueuedJob {
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    /// Whether the entry's own job has been handed to the scheduler.
    pub fn is_started(&self) -> bool {
        self.started
    }
}

impl Eq for QueuedJob {}

impl PartialEq for QueuedJob {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Ord for QueuedJob {
    fn cmp(&self, other: &Self) -> Ordering {
        // Higher priority first, then earlier submission
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct JobQueue {
    heap: BinaryHeap<QueuedJob>,
    current: Option<QueuedJob>,
    next_seq: u64,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and queue a job. Starts it right away when nothing from the
    /// queue is executing.
    pub fn enqueue(
        &mut self,
        scheduler: &mut Scheduler,
        selection: Selection,
        mode: Mode,
        priority: i32,
    ) -> Result<(), ValidationError> {
        let target = selection.validate()?.clone();
        self.next_seq += 1;
        tracing::info!(target_id = %target, priority, %mode, "job queued");
        self.heap.push(QueuedJob {
            target,
            selection,
            mode,
            priority,
            enqueued_at: Instant::now(),
            seq: self.next_seq,
            started: false,
        });
        if self.current.is_none() {
            self.start_next(scheduler);
        }
        Ok(())
    }

    /// Queue monitor: start a waiting entry once its target is free, clear
    /// the current entry once its own job is gone, then start the next one.
    pub fn poll(&mut self, scheduler: &mut Scheduler) {
        if let Some(current) = self.current.take() {
            if scheduler.has_active_job(current.target()) {
                self.current = Some(current);
                return;
            }
            if current.started {
                tracing::info!(target_id = %current.target(), "queued job finished");
            } else if self.try_start(scheduler, current) {
                return;
            }
        }
        self.start_next(scheduler);
    }

    fn start_next(&mut self, scheduler: &mut Scheduler) {
        while let Some(next) = self.heap.pop() {
            tracing::debug!(target_id = %next.target(), remaining = self.heap.len(), "processing queued job");
            if self.try_start(scheduler, next) {
                return;
            }
        }
    }

    /// Make `entry` current, starting its job unless the target is busy.
    /// Returns false if the entry was dropped.
    fn try_start(&mut self, scheduler: &mut Scheduler, mut entry: QueuedJob) -> bool {
        match scheduler.start(entry.selection.clone(), entry.mode) {
            Ok(StartOutcome::Started { .. }) => {
                entry.started = true;
                self.current = Some(entry);
                true
            }
            Ok(StartOutcome::AlreadyActive) => {
                tracing::info!(
                    target_id = %entry.target(),
                    "target already busy, queued job waits for it"
                );
                self.current = Some(entry);
                true
            }
            // Entries are validated on enqueue; kept for safety against direct edits.
            Err(e) => {
                tracing::warn!(target_id = %entry.target(), "dropping queued job: {}", e);
                false
            }
        }
    }

    /// Drop every pending entry and cancel the executing one.
    pub fn cancel_all(&mut self, scheduler: &mut Scheduler) {
        let pending = self.heap.len();
        self.heap.clear();
        // A waiting entry does not own the job running on its target.
        if let Some(current) = self.current.take().filter(|c| c.started) {
            scheduler.cancel(current.target());
        }
        tracing::info!(pending, "queue cleared");
    }

    /// Remove the pending entry at `index` in [`JobQueue::list`] order.
    /// Out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<QueuedJob> {
        if index >= self.heap.len() {
            return None;
        }
        let mut entries = self.list();
        let removed = entries.remove(index);
        self.heap = entries.into_iter().collect();
        Some(removed)
    }

    /// Pending entries, next to run first.
    pub fn list(&self) -> Vec<QueuedJob> {
        let mut entries = self.heap.clone().into_sorted_vec();
        entries.reverse();
        entries
    }

    /// Number of pending entries (not counting the executing one).
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn current(&self) -> Option<&QueuedJob> {
        self.current.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PregenConfig;
    use crate::control::LoadTicket;
    use crate::host::ChunkLoader;
    use crate::notify::NotificationHub;
    use crate::scheduler::Collaborators;
    use crate::selection::Coord;
    use std::sync::Arc;

    struct Ignore;

    impl ChunkLoader for Ignore {
        fn request_load(&self, _target: &TargetId, _coord: Coord, _ticket: LoadTicket) {}
    }

    fn scheduler() -> Scheduler {
        let collab = Collaborators::new(Arc::new(Ignore))
            .with_memory(Arc::new(ZeroMemory))
            .with_notifier(NotificationHub::new());
        Scheduler::new(PregenConfig::default(), collab)
    }

    struct ZeroMemory;

    impl crate::host::MemorySource for ZeroMemory {
        fn used_ratio(&self) -> f64 {
            0.0
        }
    }

    fn sel(name: &str) -> Selection {
        Selection::new(name, 1)
    }

    fn targets(q: &JobQueue) -> Vec<String> {
        q.list().iter().map(|j| j.target().to_string()).collect()
    }

    #[test]
    fn higher_priority_first() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        q.enqueue(&mut s, sel("running"), Mode::Normal, 0).unwrap();
        q.enqueue(&mut s, sel("p5"), Mode::Normal, 5).unwrap();
        q.enqueue(&mut s, sel("p1"), Mode::Normal, 1).unwrap();
        q.enqueue(&mut s, sel("p9"), Mode::Normal, 9).unwrap();
        assert_eq!(q.current().unwrap().target().as_str(), "running");
        assert_eq!(targets(&q), vec!["p9", "p5", "p1"]);
    }

    #[test]
    fn equal_priority_is_fifo() {
        let a = QueuedJob {
            target: TargetId::new("a"),
            selection: sel("a"),
            mode: Mode::Normal,
            priority: 3,
            enqueued_at: Instant::now(),
            seq: 1,
            started: false,
        };
        let b = QueuedJob {
            target: TargetId::new("b"),
            seq: 2,
            ..a.clone()
        };
        assert!(a > b);

        let mut s = scheduler();
        let mut q = JobQueue::new();
        q.enqueue(&mut s, sel("busy"), Mode::Normal, 0).unwrap();
        for name in ["x", "y", "z"] {
            q.enqueue(&mut s, sel(name), Mode::Normal, 2).unwrap();
        }
        assert_eq!(targets(&q), vec!["x", "y", "z"]);
    }

    #[test]
    fn invalid_selection_is_rejected_without_queueing() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        let err = q.enqueue(&mut s, Selection::new("w", -2), Mode::Normal, 0);
        assert_eq!(err, Err(ValidationError::NonPositiveRadius(-2)));
        assert!(q.is_empty());
        assert!(!q.is_processing());
    }

    #[test]
    fn monitor_starts_next_when_current_job_is_gone() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        q.enqueue(&mut s, sel("a"), Mode::Normal, 0).unwrap();
        q.enqueue(&mut s, sel("b"), Mode::Normal, 0).unwrap();
        assert!(s.has_active_job(&TargetId::new("a")));
        assert!(!s.has_active_job(&TargetId::new("b")));

        q.poll(&mut s);
        assert_eq!(q.current().unwrap().target().as_str(), "a");

        s.cancel(&TargetId::new("a"));
        q.poll(&mut s);
        assert_eq!(q.current().unwrap().target().as_str(), "b");
        assert!(s.has_active_job(&TargetId::new("b")));
        assert!(q.is_empty());

        s.cancel(&TargetId::new("b"));
        q.poll(&mut s);
        assert!(!q.is_processing());
    }

    #[test]
    fn entry_for_busy_target_runs_after_the_busy_job() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        let world = TargetId::new("world");
        s.start(Selection::new("world", 1), Mode::Normal).unwrap();
        q.enqueue(&mut s, Selection::new("world", 3), Mode::Normal, 0).unwrap();
        assert!(!q.current().unwrap().is_started());
        assert_eq!(s.get_job(&world).unwrap().total(), 9);

        q.poll(&mut s);
        assert!(!q.current().unwrap().is_started());

        s.cancel(&world);
        q.poll(&mut s);
        assert!(q.current().unwrap().is_started());
        assert_eq!(s.get_job(&world).unwrap().total(), 49);

        s.cancel(&world);
        q.poll(&mut s);
        assert!(!q.is_processing());
    }

    #[test]
    fn cancel_all_leaves_job_the_queue_does_not_own() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        s.start(Selection::new("world", 1), Mode::Normal).unwrap();
        q.enqueue(&mut s, Selection::new("world", 3), Mode::Normal, 0).unwrap();
        q.cancel_all(&mut s);
        assert!(!q.is_processing());
        assert!(s.has_active_job(&TargetId::new("world")));
    }

    #[test]
    fn remove_at_ignores_out_of_range() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        q.enqueue(&mut s, sel("busy"), Mode::Normal, 0).unwrap();
        q.enqueue(&mut s, sel("a"), Mode::Normal, 1).unwrap();
        q.enqueue(&mut s, sel("b"), Mode::Normal, 2).unwrap();
        assert!(q.remove_at(5).is_none());
        assert_eq!(q.remove_at(0).unwrap().target().as_str(), "b");
        assert_eq!(targets(&q), vec!["a"]);
    }

    #[test]
    fn cancel_all_clears_queue_and_current_job() {
        let mut s = scheduler();
        let mut q = JobQueue::new();
        q.enqueue(&mut s, sel("a"), Mode::Normal, 0).unwrap();
        q.enqueue(&mut s, sel("b"), Mode::Normal, 0).unwrap();
        q.cancel_all(&mut s);
        assert!(q.is_empty());
        assert!(!q.is_processing());
        assert_eq!(s.job_count(), 0);
    }
}
