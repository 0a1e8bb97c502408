//! Traversal generator: ordered unit sequence plus dispatch bookkeeping.
//!
//! `prepare` enumerates the selection once; the resulting length is the
//! authoritative total for progress. `next_batch` hands out units past the
//! cursor (failed units waiting for a retry go first) and records each as
//! in flight until its completion is applied. The generator is complete only
//! when the cursor is exhausted and nothing is in flight or waiting for retry.

pub mod pattern;

use std::collections::{HashMap, VecDeque};
use std::time::Instant;

use crate::control::{Completion, LoadOutcome};
use crate::job::Job;
use crate::retry::{FailureKind, RetryDecision, RetryPolicy};
use crate::selection::{Coord, Selection};

#[derive(Debug, Clone, Copy)]
struct InFlight {
    attempt: u32,
    issued_at: Instant,
}

/// Effect of applying one completion (or timeout) to the job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Loaded,
    /// Failed; queued again as attempt `next_attempt`.
    Retrying { next_attempt: u32 },
    /// Failed on the last allowed attempt; unit given up.
    Skipped { attempts: u32 },
    /// Not the outstanding attempt for this unit; ignored.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Generator {
    sequence: Vec<Coord>,
    cursor: usize,
    retries: VecDeque<(Coord, u32)>,
    in_flight: HashMap<Coord, InFlight>,
}

impl Generator {
    /// Enumerate `selection` in its pattern order, translated to the center chunk.
    pub fn prepare(selection: &Selection) -> Self {
        let center = selection.center_chunk();
        let sequence = pattern::offsets(selection.pattern, selection.shape, selection.radius)
            .into_iter()
            .map(|o| Coord::new(center.x + o.x, center.z + o.z))
            .collect();
        Self::from_sequence(sequence)
    }

    pub(crate) fn from_sequence(sequence: Vec<Coord>) -> Self {
        Self {
            sequence,
            cursor: 0,
            retries: VecDeque::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn sequence(&self) -> &[Coord] {
        &self.sequence
    }

    pub fn total(&self) -> u64 {
        self.sequence.len() as u64
    }

    /// Index of the next fresh unit.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn outstanding(&self) -> usize {
        self.in_flight.len()
    }

    pub fn pending_retries(&self) -> usize {
        self.retries.len()
    }

    /// Cursor has consumed the whole sequence.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.sequence.len()
    }

    /// Exhausted and every dispatched unit has been resolved.
    pub fn is_complete(&self) -> bool {
        self.is_exhausted() && self.in_flight.is_empty() && self.retries.is_empty()
    }

    /// Dispatch up to `n` units through `issue(coord, attempt)`. Returns how many
    /// were issued.
    pub fn next_batch<F>(&mut self, n: usize, now: Instant, mut issue: F) -> usize
    where
        F: FnMut(Coord, u32),
    {
        let mut issued = 0;
        while issued < n {
            let (coord, attempt) = if let Some(retry) = self.retries.pop_front() {
                retry
            } else if let Some(&coord) = self.sequence.get(self.cursor) {
                self.cursor += 1;
                (coord, 1)
            } else {
                break;
            };
            self.in_flight.insert(coord, InFlight { attempt, issued_at: now });
            issue(coord, attempt);
            issued += 1;
        }
        issued
    }

    /// Apply a completion for this generator's job. Generation matching is the
    /// caller's responsibility.
    pub fn apply(&mut self, completion: &Completion, job: &mut Job, policy: &RetryPolicy) -> Applied {
        match self.in_flight.get(&completion.coord) {
            Some(f) if f.attempt == completion.attempt => {}
            _ => return Applied::Stale,
        }
        self.in_flight.remove(&completion.coord);
        match completion.outcome {
            LoadOutcome::Loaded => {
                if job.mark_processed(completion.coord) {
                    Applied::Loaded
                } else {
                    Applied::Stale
                }
            }
            LoadOutcome::Failed => {
                self.fail(completion.coord, completion.attempt, FailureKind::Failed, job, policy)
            }
            LoadOutcome::Abandoned => {
                self.fail(completion.coord, completion.attempt, FailureKind::Abandoned, job, policy)
            }
        }
    }

    /// Treat requests outstanding past the policy timeout as failed.
    pub fn expire_overdue(
        &mut self,
        now: Instant,
        job: &mut Job,
        policy: &RetryPolicy,
    ) -> Vec<(Coord, Applied)> {
        let mut overdue: Vec<(Coord, u32)> = self
            .in_flight
            .iter()
            .filter(|(_, f)| policy.is_overdue(f.issued_at, now))
            .map(|(c, f)| (*c, f.attempt))
            .collect();
        overdue.sort();
        overdue
            .into_iter()
            .map(|(coord, attempt)| {
                self.in_flight.remove(&coord);
                (coord, self.fail(coord, attempt, FailureKind::TimedOut, job, policy))
            })
            .collect()
    }

    fn fail(
        &mut self,
        coord: Coord,
        attempt: u32,
        kind: FailureKind,
        job: &mut Job,
        policy: &RetryPolicy,
    ) -> Applied {
        match policy.decide(attempt, kind) {
            RetryDecision::Retry => {
                tracing::debug!(target_id = %job.target(), %coord, attempt, "load {}, retrying", kind);
                self.retries.push_back((coord, attempt + 1));
                Applied::Retrying {
                    next_attempt: attempt + 1,
                }
            }
            RetryDecision::Skip => {
                tracing::warn!(
                    target_id = %job.target(),
                    %coord,
                    attempt,
                    "load {}, skipping chunk after {} attempt(s)",
                    kind,
                    attempt
                );
                job.mark_skipped(coord);
                Applied::Skipped { attempts: attempt }
            }
        }
    }
}
