//! Per-tick batch sizing.
//!
//! The strategy is picked once when a job starts and then consulted every
//! tick with a fresh load sample. No smoothing is applied: the batch follows
//! the load sample of the current tick.

use crate::config::PregenConfig;
use crate::job::Mode;

/// Batch-size strategy for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateStrategy {
    /// NORMAL: constant units per tick.
    Fixed { units_per_tick: u32 },
    /// PRO: linear in host load between `min_load` and `target_load`.
    Adaptive {
        min_units: u32,
        max_units: u32,
        min_load: f64,
        target_load: f64,
    },
    /// FAST: constant large batch, host side effects suspended.
    FixedHigh { units_per_tick: u32 },
}

impl RateStrategy {
    /// Build the strategy for `mode` from config. Per-tick counts below one
    /// are raised to one so every running job keeps advancing.
    pub fn for_mode(mode: Mode, cfg: &PregenConfig) -> Self {
        match mode {
            Mode::Normal => RateStrategy::Fixed {
                units_per_tick: at_least_one(
                    mode,
                    "normal.units_per_second / ticks_per_second",
                    cfg.normal.units_per_second / cfg.ticks_per_second.max(1),
                ),
            },
            Mode::Pro => {
                let min_units = at_least_one(mode, "pro.min_units_per_tick", cfg.pro.min_units_per_tick);
                RateStrategy::Adaptive {
                    min_units,
                    max_units: cfg.pro.max_units_per_tick.max(min_units),
                    min_load: cfg.pro.min_load,
                    target_load: cfg.pro.target_load,
                }
            }
            Mode::Fast => RateStrategy::FixedHigh {
                units_per_tick: at_least_one(mode, "fast.units_per_tick", cfg.fast.units_per_tick),
            },
        }
    }

    /// Units to issue this tick given the current load sample.
    pub fn batch_size(&self, load: f64) -> u32 {
        match *self {
            RateStrategy::Fixed { units_per_tick } | RateStrategy::FixedHigh { units_per_tick } => {
                units_per_tick
            }
            RateStrategy::Adaptive {
                min_units,
                max_units,
                min_load,
                target_load,
            } => {
                if load >= target_load {
                    max_units
                } else if load <= min_load {
                    min_units
                } else {
                    let ratio = (load - min_load) / (target_load - min_load);
                    min_units + ((max_units - min_units) as f64 * ratio) as u32
                }
            }
        }
    }

    /// True when collaborators should suspend expensive host side effects.
    pub fn suspends_side_effects(&self) -> bool {
        matches!(self, RateStrategy::FixedHigh { .. })
    }

    /// Whether the batch depends on the load sample at all.
    pub fn needs_load(&self) -> bool {
        matches!(self, RateStrategy::Adaptive { .. })
    }
}

fn at_least_one(mode: Mode, setting: &str, units: u32) -> u32 {
    if units == 0 {
        tracing::warn!(%mode, setting, "configured rate is below one unit per tick, using 1");
        return 1;
    }
    units
}
