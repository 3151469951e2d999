// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! `wl-trace`: run a Wayland client behind a transparent tracing proxy, or
//! decode a previously recorded capture.
//!
//! Decoded messages go to stdout, one per line. Diagnostics go to stderr.

use std::path::PathBuf;
use wl_trace_logging::CliLoggingArgs;

pub mod config;
pub mod endpoint;
pub mod exit;
pub mod output;
pub mod replay;
pub mod run;

pub use clap::Parser;
pub use config::{Config, Settings};
pub use exit::{exit_code, TraceFailure};

#[derive(clap::Parser, Debug)]
#[command(
    name = "wl-trace",
    about = "Transparent Wayland protocol tracer",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(flatten)]
    pub trace: TraceArgs,
    #[command(flatten)]
    pub logging: CliLoggingArgs,
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by live tracing and replay
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TraceArgs {
    /// Only show lines matching this regex
    #[arg(long, env = "WL_TRACE_FILTER", global = true)]
    pub filter: Option<String>,
    /// Hide lines matching this regex
    #[arg(long, env = "WL_TRACE_IGNORE", global = true)]
    pub ignore: Option<String>,
    /// Extra JSON protocol table; repeatable, later tables win
    #[arg(long = "schema", value_name = "FILE", global = true)]
    pub schema: Vec<PathBuf>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Start a program with its Wayland connection routed through the tracer
    Run(run::RunArgs),
    /// Decode a capture file written by `run --capture` ("-" reads stdin)
    Replay(replay::ReplayArgs),
}

/// Load configuration, set up logging and dispatch the subcommand
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    cli.logging.merge(&config.logging).init("wl-trace")?;

    let settings = Settings::resolve(&cli.trace, &config)?;
    match cli.command {
        Commands::Run(args) => run::run(args, settings).await,
        Commands::Replay(args) => replay::replay(args, settings).await,
    }
}
