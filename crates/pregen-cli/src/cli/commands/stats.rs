//! `pregen stats` – show recorded generation statistics.

use anyhow::Result;
use pregen_core::selection::TargetId;
use pregen_core::stats::StatisticsStore;

pub fn run_stats(target: Option<&str>) -> Result<()> {
    let path = StatisticsStore::default_path()?;
    let store = StatisticsStore::load_from_path(&path)?.unwrap_or_default();

    let mut targets: Vec<String> = match target {
        Some(t) => vec![t.to_string()],
        None => store.snapshot().targets.into_keys().collect(),
    };
    if targets.is_empty() {
        println!("No statistics recorded yet.");
        return Ok(());
    }
    targets.sort();
    for t in targets {
        print!("{}", store.report(&TargetId::new(t)));
    }
    Ok(())
}
