//! Tick loop shared by `run` and `queue`: drives the engine at the configured
//! tick rate against the simulated host until it is idle or interrupted.

use anyhow::Result;
use pregen_core::config::PregenConfig;
use pregen_core::engine::Engine;
use pregen_core::notify::{LogNotifier, NotificationHub};
use pregen_core::scheduler::{format_duration, Collaborators};
use pregen_core::stats::StatisticsStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cli::sim::{MeasuredLoad, SimulatedLoader};
use crate::cli::SimArgs;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Engine wired to the simulated host, plus what the loop needs around it.
pub struct Driver {
    pub engine: Engine,
    load: Arc<MeasuredLoad>,
    stats: Arc<StatisticsStore>,
}

impl Driver {
    pub fn new(cfg: &PregenConfig, sim: &SimArgs) -> Self {
        let load = Arc::new(MeasuredLoad::new(cfg.ticks_per_second));
        let stats = match StatisticsStore::default_path() {
            Ok(path) => Arc::new(StatisticsStore::load_or_empty(&path)),
            Err(e) => {
                tracing::warn!("statistics path unavailable: {:#}", e);
                Arc::new(StatisticsStore::new())
            }
        };
        let loader = Arc::new(SimulatedLoader::new(
            Duration::from_millis(sim.latency_ms),
            sim.fail_every,
        ));
        let collab = Collaborators::new(loader)
            .with_load(load.clone())
            .with_stats(stats.clone())
            .with_notifier(NotificationHub::new().with_sink(Arc::new(LogNotifier)));
        Self {
            engine: Engine::new(cfg.clone(), collab),
            load,
            stats,
        }
    }

    /// Tick until nothing is running or queued. Ctrl-C cancels everything.
    pub async fn run(mut self, cfg: &PregenConfig) -> Result<()> {
        let started = Instant::now();
        let mut interval = tokio::time::interval(cfg.tick_duration());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut last_print = Instant::now();
        let mut interrupted = false;

        while !self.engine.is_idle() {
            tokio::select! {
                _ = interval.tick() => {}
                res = &mut ctrl_c => {
                    res?;
                    println!();
                    println!("Interrupted, cancelling.");
                    self.engine.cancel_queue();
                    self.engine.scheduler_mut().cancel_all();
                    interrupted = true;
                    break;
                }
            }
            let now = Instant::now();
            self.load.record(now);
            self.engine.tick_at(now);

            if now.duration_since(last_print) >= PROGRESS_INTERVAL {
                self.print_progress();
                last_print = now;
            }
        }

        if let Ok(path) = StatisticsStore::default_path() {
            self.stats.save_or_warn(&path);
        }
        if !interrupted {
            println!("Done in {}.", format_duration(started.elapsed()));
        }
        Ok(())
    }

    fn print_progress(&self) {
        let scheduler = self.engine.scheduler();
        for target in scheduler.active_targets() {
            let (Some(job), Some(stats)) = (scheduler.get_job(&target), scheduler.status(&target)) else {
                continue;
            };
            let eta = stats
                .eta()
                .map(format_duration)
                .unwrap_or_else(|| "?".to_string());
            println!(
                "  {:<12} {} / {} ({:.1}%)  {:.1} chunks/s  ETA {}  [{}]",
                target.as_str(),
                stats.units_done,
                stats.total_units,
                stats.percent(),
                stats.units_per_sec(),
                eta,
                job.state().as_str()
            );
        }
        let queued = self.engine.queue().len();
        if queued > 0 {
            println!("  {} queued", queued);
        }
    }
}
