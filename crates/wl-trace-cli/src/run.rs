// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Live tracing: spawn the program behind a fresh proxy socket
//!
//! The run ends once the program has exited and every session it opened is
//! closed, on SIGINT/SIGTERM, or when the compositor cannot be reached.

use crate::config::Settings;
use crate::endpoint::Endpoints;
use crate::exit::TraceFailure;
use crate::output::spawn_writer;
use anyhow::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs::File;
use std::io::BufWriter;
use std::os::fd::AsFd;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use wl_trace_decoder::Observer;
use wl_trace_proto::CaptureWriter;
use wl_trace_relay::{spawn_observer, Proxy, ProxyEvent, RelayError};

/// How long the program gets to exit after SIGTERM before it is killed
const TERMINATE_GRACE: Duration = Duration::from_secs(2);

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Record raw relayed traffic to this file for later `replay`
    #[arg(long, value_name = "FILE")]
    pub capture: Option<PathBuf>,
    /// Program to start, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM"
    )]
    pub command: Vec<String>,
}

pub async fn run(args: RunArgs, settings: Settings) -> Result<()> {
    let (name, program_args) = args
        .command
        .split_first()
        .context("no program given")?;
    let program = which::which(name).map_err(|source| TraceFailure::TargetNotFound {
        program: name.clone(),
        source,
    })?;
    let endpoints = Endpoints::from_env(std::process::id())?;
    debug!(upstream = %endpoints.upstream.display(), proxy = %endpoints.proxy.display(), "endpoints resolved");

    let capture = match args.capture.as_ref().or(settings.capture.as_ref()) {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating capture {}", path.display()))?;
            info!(path = %path.display(), "recording capture");
            Some(CaptureWriter::new(BufWriter::new(file))?)
        }
        None => None,
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    let writer = spawn_writer(tokio::io::stdout(), lines_rx);
    let observer = spawn_observer(
        Observer::new(settings.schema, settings.filter),
        capture,
        events_rx,
        lines_tx,
    );
    let mut proxy = Proxy::bind(&endpoints.proxy, &endpoints.upstream, events_tx)?;

    let mut child = Command::new(&program)
        .args(program_args)
        .env("WAYLAND_DISPLAY", &endpoints.display)
        .stdin(Stdio::inherit())
        .stdout(stderr_stdio()?)
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| TraceFailure::Spawn {
            program: program.clone(),
            source,
        })?;
    info!(pid = child.id(), program = %program.display(), "started program");

    let outcome = supervise(&mut proxy, &mut child).await;

    proxy.shutdown().await;
    drop(proxy);
    if let Ok(None) = child.try_wait() {
        terminate(&mut child).await;
    }

    if let Err(e) = observer.await {
        warn!("observer task failed: {e}");
    }
    match writer.await {
        Ok(Ok(lines)) => debug!(lines, "observation stream closed"),
        Ok(Err(e)) => warn!("writing observation stream failed: {e}"),
        Err(e) => warn!("writer task failed: {e}"),
    }

    outcome
}

/// Child stdout shares our stderr; stdout belongs to the observation stream
fn stderr_stdio() -> Result<Stdio> {
    let fd = std::io::stderr()
        .as_fd()
        .try_clone_to_owned()
        .context("duplicating stderr")?;
    Ok(Stdio::from(fd))
}

async fn supervise(proxy: &mut Proxy, child: &mut Child) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut exited: Option<ExitStatus> = None;

    loop {
        if exited.is_some() && proxy.active_sessions() == 0 {
            return Ok(());
        }

        tokio::select! {
            event = proxy.next_event() => match event? {
                ProxyEvent::Accepted { session } => debug!(session, "session started"),
                ProxyEvent::Finished { session, result: Ok(()) } => {
                    info!(session, "session finished");
                }
                ProxyEvent::Finished {
                    session,
                    result: Err(RelayError::UpstreamUnavailable { path, source }),
                } => {
                    error!(session, "compositor unreachable: {source}");
                    return Err(TraceFailure::UpstreamUnreachable { path }.into());
                }
                ProxyEvent::Finished { session, result: Err(e) } => {
                    warn!(session, "session ended: {e}");
                }
            },
            status = child.wait(), if exited.is_none() => {
                let status = status.context("waiting for program")?;
                if status.success() {
                    info!("program exited");
                } else {
                    warn!(%status, "program exited with failure");
                }
                exited = Some(status);
            }
            _ = sigint.recv() => {
                info!(operation = "shutdown", signal = "SIGINT", "Received SIGINT, shutting down");
                return Ok(());
            }
            _ = sigterm.recv() => {
                info!(operation = "shutdown", signal = "SIGTERM", "Received SIGTERM, shutting down");
                return Ok(());
            }
        }
    }
}

/// SIGTERM, then SIGKILL if the program outlives the grace period
async fn terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    debug!(pid, "terminating program");
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
        debug!(pid, "SIGTERM failed: {e}");
    }

    match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
        Ok(Ok(status)) => debug!(%status, "program terminated"),
        Ok(Err(e)) => warn!("waiting for program: {e}"),
        Err(_) => {
            warn!(pid, "program ignored SIGTERM, killing it");
            if let Err(e) = child.kill().await {
                warn!("killing program failed: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit::EXIT_TARGET_NOT_FOUND;
    use wl_trace_decoder::Filter;
    use wl_trace_schema::Schema;

    #[tokio::test]
    async fn test_missing_program_is_target_not_found() {
        let args = RunArgs {
            capture: None,
            command: vec!["wl-trace-no-such-program".to_string()],
        };
        let settings = Settings::new(Filter::allow_all(), Schema::builtin());

        let err = run(args, settings).await.unwrap_err();
        assert_eq!(crate::exit_code(&err), EXIT_TARGET_NOT_FOUND);
        assert!(err.to_string().contains("wl-trace-no-such-program"));
    }
}
