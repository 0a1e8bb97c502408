//! Tests for estimate, stats, config and global flags.

use super::parse;
use crate::cli::{Cli, CliCommand};
use clap::Parser;

#[test]
fn cli_parse_estimate() {
    match parse(&["pregen", "estimate", "-r", "10", "--shape", "circle"]) {
        CliCommand::Estimate { selection } => {
            assert_eq!(selection.radius, Some(10));
        }
        _ => panic!("expected Estimate"),
    }
}

#[test]
fn cli_parse_stats() {
    match parse(&["pregen", "stats"]) {
        CliCommand::Stats { target } => assert!(target.is_none()),
        _ => panic!("expected Stats"),
    }
    match parse(&["pregen", "stats", "world"]) {
        CliCommand::Stats { target } => assert_eq!(target.as_deref(), Some("world")),
        _ => panic!("expected Stats with target"),
    }
}

#[test]
fn cli_parse_config() {
    match parse(&["pregen", "config"]) {
        CliCommand::Config => {}
        _ => panic!("expected Config"),
    }
}

#[test]
fn cli_verbose_is_global() {
    let cli = Cli::try_parse_from(["pregen", "stats", "--verbose"]).unwrap();
    assert!(cli.verbose);
    let cli = Cli::try_parse_from(["pregen", "config"]).unwrap();
    assert!(!cli.verbose);
}
