use clap::Parser;
use pregen_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging as early as possible; fall back to stderr if the state dir is unusable.
    if cli.verbose {
        logging::init_logging_stderr();
    } else if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }

    if let Err(err) = cli.run().await {
        eprintln!("pregen error: {:#}", err);
        std::process::exit(1);
    }
}
