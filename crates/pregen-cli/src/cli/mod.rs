//! CLI for the pregen chunk pre-generation scheduler.

mod commands;
mod entry;
mod sim;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pregen_core::config::{self, PregenConfig};
use pregen_core::job::Mode;
use pregen_core::selection::{Pattern, Selection, Shape};

pub use entry::QueueEntry;

use commands::{run_config, run_estimate, run_generate, run_queue, run_stats};

/// Top-level CLI for pregen.
#[derive(Debug, Parser)]
#[command(name = "pregen")]
#[command(about = "pregen: adaptive chunk pre-generation scheduler", long_about = None)]
pub struct Cli {
    /// Log to stderr instead of the state-dir log file.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Region options shared by the generating commands. Unset values fall back
/// to the `[defaults]` config section.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
    /// Radius in chunks.
    #[arg(long, short)]
    pub radius: Option<i32>,
    /// square or circle.
    #[arg(long)]
    pub shape: Option<Shape>,
    /// spiral or concentric.
    #[arg(long)]
    pub pattern: Option<Pattern>,
    /// Center X in blocks.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub center_x: i32,
    /// Center Z in blocks.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub center_z: i32,
    /// Fit the radius to a square world border of this size (blocks).
    #[arg(long, value_name = "SIZE", conflicts_with = "radius")]
    pub border: Option<f64>,
}

impl SelectionArgs {
    /// Build a selection on `target`; `radius` overrides `--radius` when given.
    pub fn to_selection(&self, target: &str, radius: Option<i32>, cfg: &PregenConfig) -> Selection {
        let sel = Selection::new(target, radius.or(self.radius).unwrap_or(cfg.defaults.radius))
            .with_shape(self.shape.unwrap_or(cfg.defaults.shape))
            .with_pattern(self.pattern.unwrap_or(cfg.defaults.pattern))
            .with_center(self.center_x, self.center_z);
        match self.border {
            Some(size) if radius.is_none() => sel.fit_to_border(self.center_x, self.center_z, size),
            _ => sel,
        }
    }
}

/// Options of the simulated host used by `run` and `queue`.
#[derive(Debug, Clone, Args)]
pub struct SimArgs {
    /// Simulated latency of one chunk load, in milliseconds.
    #[arg(long, default_value_t = 5, value_name = "MS")]
    pub latency_ms: u64,
    /// Make every Nth simulated load fail (0 disables failures).
    #[arg(long, default_value_t = 0, value_name = "N")]
    pub fail_every: u64,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Pre-generate one region against the simulated host.
    Run {
        /// Target world.
        #[arg(long, short, default_value = "world")]
        target: String,
        /// normal, pro or fast.
        #[arg(long, short)]
        mode: Option<Mode>,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        sim: SimArgs,
    },

    /// Queue several regions (TARGET:RADIUS[:PRIORITY]) and run them one at a time.
    Queue {
        /// Entries, highest priority runs first.
        #[arg(required = true, value_name = "TARGET:RADIUS[:PRIORITY]")]
        entries: Vec<QueueEntry>,
        /// normal, pro or fast.
        #[arg(long, short)]
        mode: Option<Mode>,
        #[command(flatten)]
        selection: SelectionArgs,
        #[command(flatten)]
        sim: SimArgs,
    },

    /// Show the exact chunk count and expected duration per mode.
    Estimate {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Show recorded generation statistics.
    Stats {
        /// Only this target.
        target: Option<String>,
    },

    /// Print the config file path and the effective configuration.
    Config,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Run {
                target,
                mode,
                selection,
                sim,
            } => {
                let sel = selection.to_selection(&target, None, &cfg);
                let mode = mode.unwrap_or(cfg.defaults.mode);
                run_generate(&cfg, sel, mode, &sim).await?;
            }
            CliCommand::Queue {
                entries,
                mode,
                selection,
                sim,
            } => {
                let mode = mode.unwrap_or(cfg.defaults.mode);
                run_queue(&cfg, &entries, &selection, mode, &sim).await?;
            }
            CliCommand::Estimate { selection } => {
                run_estimate(&cfg, &selection.to_selection("estimate", None, &cfg));
            }
            CliCommand::Stats { target } => run_stats(target.as_deref())?,
            CliCommand::Config => run_config(&cfg)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
