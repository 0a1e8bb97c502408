//! In-memory host collaborators for integration tests.
//!
//! Loaders resolve tickets inline, on tokio tasks after a delay, or on plain
//! threads; memory is pinned to a fixed ratio so tests never depend on the
//! machine running them.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pregen_core::control::LoadTicket;
use pregen_core::host::{ChunkLoader, MemorySource};
use pregen_core::notify::{Notification, NotificationHub, NotificationSink};
use pregen_core::scheduler::Collaborators;
use pregen_core::selection::{Coord, TargetId};

/// Resolves every request on the spot.
pub struct InlineLoader;

impl ChunkLoader for InlineLoader {
    fn request_load(&self, _target: &TargetId, _coord: Coord, ticket: LoadTicket) {
        ticket.complete(true);
    }
}

/// Resolves each request on a tokio task after `latency`.
pub struct TokioLoader {
    handle: tokio::runtime::Handle,
    latency: Duration,
}

impl TokioLoader {
    /// Must be called from inside a runtime.
    pub fn new(latency: Duration) -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
            latency,
        }
    }
}

impl ChunkLoader for TokioLoader {
    fn request_load(&self, _target: &TargetId, _coord: Coord, ticket: LoadTicket) {
        let latency = self.latency;
        self.handle.spawn(async move {
            tokio::time::sleep(latency).await;
            ticket.complete(true);
        });
    }
}

/// Resolves each request from a freshly spawned OS thread.
pub struct ThreadLoader;

impl ChunkLoader for ThreadLoader {
    fn request_load(&self, _target: &TargetId, _coord: Coord, ticket: LoadTicket) {
        std::thread::spawn(move || ticket.complete(true));
    }
}

pub struct FixedMemory(pub f64);

impl MemorySource for FixedMemory {
    fn used_ratio(&self) -> f64 {
        self.0
    }
}

/// Notification sink that keeps every event.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<Notification>>);

impl Recorder {
    pub fn events(&self) -> Vec<Notification> {
        self.0.lock().unwrap().clone()
    }

    /// Targets of `Started` events, in order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|n| match n {
                Notification::Started { target, .. } => Some(target.to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn completed(&self) -> Vec<(String, u64, u64)> {
        self.events()
            .iter()
            .filter_map(|n| match n {
                Notification::Completed {
                    target,
                    done,
                    skipped,
                    ..
                } => Some((target.to_string(), *done, *skipped)),
                _ => None,
            })
            .collect()
    }
}

impl NotificationSink for Recorder {
    fn notify(&self, event: &Notification) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Collaborators around `loader` with low memory usage and a recording notifier.
pub fn collaborators(loader: Arc<dyn ChunkLoader>) -> (Collaborators, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let collab = Collaborators::new(loader)
        .with_memory(Arc::new(FixedMemory(0.2)))
        .with_notifier(NotificationHub::new().with_sink(recorder.clone()));
    (collab, recorder)
}
