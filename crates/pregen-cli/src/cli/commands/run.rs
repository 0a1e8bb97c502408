//! `pregen run` – pre-generate one region against the simulated host.

use anyhow::Result;
use pregen_core::config::PregenConfig;
use pregen_core::job::Mode;
use pregen_core::scheduler::StartOutcome;
use pregen_core::selection::Selection;

use super::drive::Driver;
use crate::cli::SimArgs;

pub async fn run_generate(cfg: &PregenConfig, selection: Selection, mode: Mode, sim: &SimArgs) -> Result<()> {
    let mut driver = Driver::new(cfg, sim);
    let target = selection.validate()?.clone();
    let (shape, pattern, radius) = (selection.shape, selection.pattern, selection.radius);

    match driver.engine.start(selection, mode)? {
        StartOutcome::Started { total } => println!(
            "Generating {} chunks on '{}' ({} {} radius {}, {} mode)",
            total, target, shape, pattern, radius, mode
        ),
        StartOutcome::AlreadyActive => {
            println!("'{}' already has a job.", target);
            return Ok(());
        }
    }

    driver.run(cfg).await
}
