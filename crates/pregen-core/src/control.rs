//! Load tickets and the completion channel.
//!
//! Every load request carries a `LoadTicket`. The loader resolves it from any
//! thread; the resolution travels through an unbounded channel that only the
//! scheduler tick drains, so job state is never touched outside the tick.
//! Tickets are stamped with the job generation and attempt number so the tick
//! can recognise completions that belong to a cancelled job or a timed-out
//! attempt and drop them.

use tokio::sync::mpsc;

use crate::selection::{Coord, TargetId};

/// Outcome reported for one load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    Failed,
    /// Ticket was dropped without being resolved.
    Abandoned,
}

/// Resolution of one load attempt, as seen by the tick loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub target: TargetId,
    pub generation: u64,
    pub coord: Coord,
    pub attempt: u32,
    pub outcome: LoadOutcome,
}

/// Handle given to the loader for a single request. Resolve it exactly once
/// with [`LoadTicket::complete`]; dropping it unresolved reports `Abandoned`.
#[derive(Debug)]
pub struct LoadTicket {
    target: TargetId,
    generation: u64,
    coord: Coord,
    attempt: u32,
    tx: Option<mpsc::UnboundedSender<Completion>>,
}

impl LoadTicket {
    pub fn target(&self) -> &TargetId {
        &self.target
    }

    pub fn coord(&self) -> Coord {
        self.coord
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Resolve the request. Safe to call from any thread.
    pub fn complete(mut self, success: bool) {
        let outcome = if success {
            LoadOutcome::Loaded
        } else {
            LoadOutcome::Failed
        };
        self.send(outcome);
    }

    fn send(&mut self, outcome: LoadOutcome) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        // Receiver gone means the scheduler was dropped; nothing left to update.
        let _ = tx.send(Completion {
            target: self.target.clone(),
            generation: self.generation,
            coord: self.coord,
            attempt: self.attempt,
            outcome,
        });
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        self.send(LoadOutcome::Abandoned);
    }
}

/// Single-consumer completion channel owned by the scheduler.
#[derive(Debug)]
pub struct CompletionChannel {
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Default for CompletionChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionChannel {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Mint a ticket for one load attempt.
    pub fn ticket(&self, target: &TargetId, generation: u64, coord: Coord, attempt: u32) -> LoadTicket {
        LoadTicket {
            target: target.clone(),
            generation,
            coord,
            attempt,
            tx: Some(self.tx.clone()),
        }
    }

    /// Take every completion that has arrived so far without waiting.
    pub fn drain(&mut self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(c) = self.rx.try_recv() {
            out.push(c);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_sends_exactly_once() {
        let mut chan = CompletionChannel::new();
        let target = TargetId::new("world");
        let t = chan.ticket(&target, 7, Coord::new(1, -2), 1);
        t.complete(true);
        let got = chan.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].generation, 7);
        assert_eq!(got[0].coord, Coord::new(1, -2));
        assert_eq!(got[0].outcome, LoadOutcome::Loaded);
        assert!(chan.drain().is_empty());
    }

    #[test]
    fn dropped_ticket_reports_abandoned() {
        let mut chan = CompletionChannel::new();
        let target = TargetId::new("world");
        drop(chan.ticket(&target, 1, Coord::new(0, 0), 2));
        let got = chan.drain();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].outcome, LoadOutcome::Abandoned);
        assert_eq!(got[0].attempt, 2);
    }

    #[test]
    fn tickets_resolve_from_other_threads() {
        let mut chan = CompletionChannel::new();
        let target = TargetId::new("world");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let t = chan.ticket(&target, 1, Coord::new(i, 0), 1);
                std::thread::spawn(move || t.complete(i % 2 == 0))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let got = chan.drain();
        assert_eq!(got.len(), 8);
        let failed = got.iter().filter(|c| c.outcome == LoadOutcome::Failed).count();
        assert_eq!(failed, 4);
    }
}
