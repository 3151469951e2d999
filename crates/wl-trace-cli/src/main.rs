// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::process::ExitCode;
use wl_trace_cli::{execute, exit_code, Cli, Parser};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("wl-trace: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}
