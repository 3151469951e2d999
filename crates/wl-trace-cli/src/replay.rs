// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Offline decoding of capture files
//!
//! Records are consumed strictly in file order. Each session side gets its
//! own framer, and the shared [`Observer`] sees the same batches the live
//! observer saw, so the output matches what `run` printed.

use crate::config::Settings;
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use wl_trace_decoder::{Observer, Source};
use wl_trace_proto::{CaptureEvent, CaptureReader, StreamFramer};

#[derive(clap::Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Capture file, or "-" for stdin
    pub capture: PathBuf,
}

/// Totals for one replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub records: u64,
    pub lines: u64,
}

pub async fn replay(args: ReplayArgs, settings: Settings) -> Result<()> {
    let summary = tokio::task::spawn_blocking(move || -> Result<ReplaySummary> {
        let mut observer = Observer::new(settings.schema, settings.filter);
        let stdout = io::stdout();
        let mut out = BufWriter::new(stdout.lock());

        if args.capture.as_os_str() == "-" {
            replay_stream(io::stdin().lock(), &mut observer, &mut out)
        } else {
            let file = std::fs::File::open(&args.capture)
                .with_context(|| format!("opening capture {}", args.capture.display()))?;
            replay_stream(BufReader::new(file), &mut observer, &mut out)
        }
    })
    .await??;

    info!(records = summary.records, lines = summary.lines, "replay finished");
    Ok(())
}

/// Decode a whole capture stream, writing observation lines to `out`
pub fn replay_stream<R: Read, W: Write>(
    input: R,
    observer: &mut Observer,
    out: &mut W,
) -> Result<ReplaySummary> {
    let mut reader = CaptureReader::new(input).context("not a wl-trace capture")?;
    let mut framers: HashMap<Source, StreamFramer> = HashMap::new();
    // legs whose framing failed; the live relay stopped reading them too
    let mut broken: HashSet<Source> = HashSet::new();
    let mut summary = ReplaySummary::default();

    while let Some(event) = reader.next_event().context("reading capture")? {
        summary.records += 1;
        let source = Source::new(event.session(), event.direction());

        let lines = match event {
            CaptureEvent::Data {
                direction, data, ..
            } => {
                if broken.contains(&source) {
                    continue;
                }
                let framer = framers
                    .entry(source)
                    .or_insert_with(|| StreamFramer::new(direction));
                framer.push(&data);

                let mut messages = Vec::new();
                let failed = loop {
                    match framer.next_message() {
                        Ok(Some(message)) => messages.push(message),
                        Ok(None) => break false,
                        Err(e) => {
                            warn!(session = source.session, %direction, "{e}; ignoring rest of stream");
                            break true;
                        }
                    }
                };
                if failed {
                    framers.remove(&source);
                    broken.insert(source);
                }
                observer.on_messages(source, &messages, None)
            }
            CaptureEvent::Closed { .. } => {
                framers.remove(&source);
                broken.remove(&source);
                observer.on_closed(source)
            }
        };

        for line in lines {
            if let Err(e) = writeln!(out, "{line}") {
                if e.kind() == io::ErrorKind::BrokenPipe {
                    return Ok(summary);
                }
                return Err(e).context("writing observation stream");
            }
            summary.lines += 1;
        }
    }

    match out.flush() {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
            Err(e).context("writing observation stream")
        }
        _ => Ok(summary),
    }
}
