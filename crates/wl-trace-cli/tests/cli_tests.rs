// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use wl_trace_cli::exit::{EXIT_FAILURE, EXIT_TARGET_NOT_FOUND, EXIT_UPSTREAM_UNREACHABLE};
use wl_trace_cli::{exit_code, Cli, Commands, Parser, TraceFailure};
use wl_trace_logging::{CliLogLevel, LogFormat};
use wl_trace_relay::RelayError;

#[test]
fn test_cli_parsing_run_with_program_arguments() {
    let cli = Cli::try_parse_from([
        "wl-trace",
        "--filter",
        "wl_surface",
        "run",
        "--capture",
        "/tmp/session.wlcap",
        "weston-terminal",
        "--maximized",
        "-x",
    ])
    .unwrap();

    assert_eq!(cli.trace.filter.as_deref(), Some("wl_surface"));
    let Commands::Run(args) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.capture, Some(PathBuf::from("/tmp/session.wlcap")));
    assert_eq!(args.command, vec!["weston-terminal", "--maximized", "-x"]);
}

#[test]
fn test_cli_parsing_run_requires_program() {
    assert!(Cli::try_parse_from(["wl-trace", "run"]).is_err());
}

#[test]
fn test_cli_parsing_replay_with_global_options() {
    let cli = Cli::try_parse_from([
        "wl-trace",
        "replay",
        "-",
        "--ignore",
        "wl_callback",
        "--schema",
        "a.json",
        "--schema",
        "b.json",
        "--log-level",
        "debug",
        "--log-format",
        "json",
        "--config",
        "wl-trace.toml",
    ])
    .unwrap();

    let Commands::Replay(args) = cli.command else {
        panic!("expected replay");
    };
    assert_eq!(args.capture, PathBuf::from("-"));
    assert_eq!(cli.trace.ignore.as_deref(), Some("wl_callback"));
    assert_eq!(
        cli.trace.schema,
        vec![PathBuf::from("a.json"), PathBuf::from("b.json")]
    );
    assert_eq!(cli.logging.log_level, Some(CliLogLevel::Debug));
    assert_eq!(cli.logging.log_format, Some(LogFormat::Json));
    assert_eq!(cli.config, Some(PathBuf::from("wl-trace.toml")));
}

#[test]
fn test_exit_code_target_not_found() {
    let source = which::which("wl-trace-definitely-missing").unwrap_err();
    let err = anyhow::Error::from(TraceFailure::TargetNotFound {
        program: "wl-trace-definitely-missing".into(),
        source,
    });
    assert_eq!(exit_code(&err), EXIT_TARGET_NOT_FOUND);
}

#[test]
fn test_exit_code_upstream_unreachable() {
    let err = anyhow::Error::from(TraceFailure::UpstreamUnreachable {
        path: PathBuf::from("/run/user/1000/wayland-0"),
    });
    assert_eq!(exit_code(&err), EXIT_UPSTREAM_UNREACHABLE);

    let relay = RelayError::UpstreamUnavailable {
        path: PathBuf::from("/run/user/1000/wayland-0"),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    };
    let err = anyhow::Error::from(relay).context("running proxy");
    assert_eq!(exit_code(&err), EXIT_UPSTREAM_UNREACHABLE);
}

#[test]
fn test_exit_code_generic_failure() {
    let err = anyhow::anyhow!("XDG_RUNTIME_DIR not set");
    assert_eq!(exit_code(&err), EXIT_FAILURE);
}
