//! CLI command handlers. Each command is in its own file.

mod config;
mod drive;
mod estimate;
mod queue;
mod run;
mod stats;

pub use config::run_config;
pub use estimate::run_estimate;
pub use queue::run_queue;
pub use run::run_generate;
pub use stats::run_stats;
