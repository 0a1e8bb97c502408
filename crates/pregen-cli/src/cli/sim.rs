//! Simulated host for the CLI: async chunk loads on tokio tasks and a load
//! metric measured from the real tick cadence.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use pregen_core::control::LoadTicket;
use pregen_core::host::{ChunkLoader, LoadSource};
use pregen_core::selection::{Coord, TargetId};

/// Loader that "generates" a chunk after a fixed latency.
pub struct SimulatedLoader {
    handle: tokio::runtime::Handle,
    latency: Duration,
    fail_every: u64,
    issued: AtomicU64,
}

impl SimulatedLoader {
    /// Must be called from inside the runtime.
    pub fn new(latency: Duration, fail_every: u64) -> Self {
        Self {
            handle: tokio::runtime::Handle::current(),
            latency,
            fail_every,
            issued: AtomicU64::new(0),
        }
    }

    fn next_succeeds(&self) -> bool {
        let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        self.fail_every == 0 || n % self.fail_every != 0
    }
}

impl ChunkLoader for SimulatedLoader {
    fn request_load(&self, target: &TargetId, coord: Coord, ticket: LoadTicket) {
        let success = self.next_succeeds();
        let latency = self.latency;
        tracing::trace!(target_id = %target, %coord, success, "simulated load");
        self.handle.spawn(async move {
            tokio::time::sleep(latency).await;
            ticket.complete(success);
        });
    }
}

/// Ticks per second observed over a sliding window, capped at the nominal rate.
pub struct MeasuredLoad {
    nominal: f64,
    window: usize,
    ticks: Mutex<VecDeque<Instant>>,
}

impl MeasuredLoad {
    pub fn new(ticks_per_second: u32) -> Self {
        let window = ticks_per_second.max(1) as usize + 1;
        Self {
            nominal: f64::from(ticks_per_second.max(1)),
            window,
            ticks: Mutex::new(VecDeque::with_capacity(window)),
        }
    }

    /// Record the start of a tick.
    pub fn record(&self, at: Instant) {
        let mut ticks = match self.ticks.lock() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        if ticks.len() == self.window {
            ticks.pop_front();
        }
        ticks.push_back(at);
    }
}

impl LoadSource for MeasuredLoad {
    fn current_load(&self) -> f64 {
        let ticks = match self.ticks.lock() {
            Ok(t) => t,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (Some(first), Some(last)) = (ticks.front(), ticks.back()) else {
            return self.nominal;
        };
        let span = last.saturating_duration_since(*first).as_secs_f64();
        if ticks.len() < 2 || span <= 0.0 {
            return self.nominal;
        }
        ((ticks.len() - 1) as f64 / span).min(self.nominal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(load: &MeasuredLoad, every: Duration, n: u32) {
        let t0 = Instant::now();
        for i in 0..n {
            load.record(t0 + every * i);
        }
    }

    #[test]
    fn load_is_nominal_without_samples() {
        let load = MeasuredLoad::new(20);
        assert_eq!(load.current_load(), 20.0);
        load.record(Instant::now());
        assert_eq!(load.current_load(), 20.0);
    }

    #[test]
    fn load_tracks_slow_ticks() {
        let load = MeasuredLoad::new(20);
        feed(&load, Duration::from_millis(100), 30);
        assert!((load.current_load() - 10.0).abs() < 1e-6);
    }

    #[test]
    fn load_is_capped_at_nominal() {
        let load = MeasuredLoad::new(20);
        feed(&load, Duration::from_millis(10), 30);
        assert_eq!(load.current_load(), 20.0);
    }

    #[tokio::test]
    async fn every_nth_simulated_load_fails() {
        let loader = SimulatedLoader::new(Duration::ZERO, 3);
        let outcomes: Vec<bool> = (0..6).map(|_| loader.next_succeeds()).collect();
        assert_eq!(outcomes, vec![true, true, false, true, true, false]);
    }
}
