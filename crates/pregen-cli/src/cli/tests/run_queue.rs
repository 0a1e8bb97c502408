//! Tests for the run and queue subcommands.

use super::parse;
use crate::cli::{Cli, CliCommand, QueueEntry};
use clap::Parser;
use pregen_core::config::PregenConfig;
use pregen_core::job::Mode;
use pregen_core::selection::{Pattern, Shape};

#[test]
fn cli_parse_run_defaults() {
    match parse(&["pregen", "run"]) {
        CliCommand::Run {
            target,
            mode,
            selection,
            sim,
        } => {
            assert_eq!(target, "world");
            assert!(mode.is_none());
            assert!(selection.radius.is_none());
            assert_eq!((selection.center_x, selection.center_z), (0, 0));
            assert_eq!(sim.latency_ms, 5);
            assert_eq!(sim.fail_every, 0);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_run_full() {
    match parse(&[
        "pregen",
        "run",
        "--target",
        "nether",
        "--radius",
        "50",
        "--shape",
        "circle",
        "--pattern",
        "concentric",
        "--mode",
        "pro",
        "--center-x",
        "-320",
        "--center-z",
        "64",
    ]) {
        CliCommand::Run {
            target,
            mode,
            selection,
            ..
        } => {
            assert_eq!(target, "nether");
            assert_eq!(mode, Some(Mode::Pro));
            assert_eq!(selection.radius, Some(50));
            assert_eq!(selection.shape, Some(Shape::Circle));
            assert_eq!(selection.pattern, Some(Pattern::Concentric));
            assert_eq!((selection.center_x, selection.center_z), (-320, 64));
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_rejects_unknown_mode_and_shape() {
    assert!(Cli::try_parse_from(["pregen", "run", "--mode", "turbo"]).is_err());
    assert!(Cli::try_parse_from(["pregen", "run", "--shape", "hexagon"]).is_err());
}

#[test]
fn cli_radius_and_border_conflict() {
    assert!(Cli::try_parse_from(["pregen", "run", "--radius", "5", "--border", "1000"]).is_err());
}

#[test]
fn selection_falls_back_to_config_defaults() {
    let cfg = PregenConfig::default();
    match parse(&["pregen", "run", "--center-x", "160"]) {
        CliCommand::Run { selection, .. } => {
            let sel = selection.to_selection("world", None, &cfg);
            assert_eq!(sel.radius, cfg.defaults.radius);
            assert_eq!(sel.shape, Shape::Square);
            assert_eq!(sel.pattern, Pattern::Spiral);
            assert_eq!(sel.center_chunk().x, 10);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn border_sets_radius() {
    let cfg = PregenConfig::default();
    match parse(&["pregen", "run", "--border", "3200"]) {
        CliCommand::Run { selection, .. } => {
            assert_eq!(selection.to_selection("world", None, &cfg).radius, 100);
        }
        _ => panic!("expected Run"),
    }
}

#[test]
fn cli_parse_queue_entries() {
    match parse(&["pregen", "queue", "world:100:5", "nether:20", "--mode", "fast"]) {
        CliCommand::Queue { entries, mode, .. } => {
            assert_eq!(mode, Some(Mode::Fast));
            assert_eq!(
                entries,
                vec![
                    QueueEntry {
                        target: "world".into(),
                        radius: 100,
                        priority: 5
                    },
                    QueueEntry {
                        target: "nether".into(),
                        radius: 20,
                        priority: 0
                    },
                ]
            );
        }
        _ => panic!("expected Queue"),
    }
}

#[test]
fn cli_queue_needs_entries_and_valid_syntax() {
    assert!(Cli::try_parse_from(["pregen", "queue"]).is_err());
    assert!(Cli::try_parse_from(["pregen", "queue", "world"]).is_err());
    assert!(Cli::try_parse_from(["pregen", "queue", "world:ten"]).is_err());
    assert!(Cli::try_parse_from(["pregen", "queue", ":10"]).is_err());
    assert!(Cli::try_parse_from(["pregen", "queue", "w:1:2:3"]).is_err());
}
