//! `pregen config` – show where the config lives and what it resolves to.

use anyhow::Result;
use pregen_core::config::{self, PregenConfig};

pub fn run_config(cfg: &PregenConfig) -> Result<()> {
    println!("# {}", config::config_path()?.display());
    print!("{}", cfg.to_toml_string()?);
    Ok(())
}
