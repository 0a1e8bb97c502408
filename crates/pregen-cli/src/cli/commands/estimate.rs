//! `pregen estimate` – chunk count and expected duration per mode.

use pregen_core::config::PregenConfig;
use pregen_core::job::Mode;
use pregen_core::rate::RateStrategy;
use pregen_core::scheduler::format_duration;
use pregen_core::selection::Selection;
use pregen_core::traversal::Generator;
use std::time::Duration;

/// Seconds to issue `total` units at `per_tick` units per tick.
fn issue_time(total: u64, per_tick: u32, ticks_per_second: u32) -> Option<Duration> {
    let per_second = u64::from(per_tick) * u64::from(ticks_per_second.max(1));
    if per_second == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(total as f64 / per_second as f64))
}

pub fn run_estimate(cfg: &PregenConfig, selection: &Selection) {
    let total = Generator::prepare(selection).total();
    println!(
        "{} {} radius {}: {} chunks (geometric estimate {})",
        selection.shape,
        selection.pattern,
        selection.radius,
        total,
        selection.estimated_total()
    );

    let tps = cfg.ticks_per_second;
    for mode in [Mode::Normal, Mode::Pro, Mode::Fast] {
        let strategy = RateStrategy::for_mode(mode, cfg);
        let fastest = issue_time(total, strategy.batch_size(f64::INFINITY), tps);
        let slowest = issue_time(total, strategy.batch_size(0.0), tps);
        let fmt = |d: Option<Duration>| d.map(format_duration).unwrap_or_else(|| "never".to_string());
        if fastest == slowest {
            println!("  {:<6} ~{}", mode.to_string(), fmt(fastest));
        } else {
            println!("  {:<6} {} to {}", mode.to_string(), fmt(fastest), fmt(slowest));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_time_from_rate() {
        assert_eq!(issue_time(400, 1, 20), Some(Duration::from_secs(20)));
        assert_eq!(issue_time(400, 0, 20), None);
    }
}
