//! `pregen queue` – queue several regions and run them by priority.

use anyhow::{Context, Result};
use pregen_core::config::PregenConfig;
use pregen_core::job::Mode;

use super::drive::Driver;
use crate::cli::{QueueEntry, SelectionArgs, SimArgs};

pub async fn run_queue(
    cfg: &PregenConfig,
    entries: &[QueueEntry],
    selection: &SelectionArgs,
    mode: Mode,
    sim: &SimArgs,
) -> Result<()> {
    let mut driver = Driver::new(cfg, sim);
    for entry in entries {
        let sel = selection.to_selection(&entry.target, Some(entry.radius), cfg);
        driver
            .engine
            .enqueue(sel, mode, entry.priority)
            .with_context(|| format!("queue {}:{}", entry.target, entry.radius))?;
    }

    if let Some(current) = driver.engine.queue().current() {
        println!("Processing '{}' first", current.target());
    }
    for (i, job) in driver.engine.list_queue().iter().enumerate() {
        println!(
            "  #{} {} radius {} priority {}",
            i + 1,
            job.target(),
            job.selection.radius,
            job.priority
        );
    }

    driver.run(cfg).await
}
