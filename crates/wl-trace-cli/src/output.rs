// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Observation stream writer

use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::debug;

/// Write every observation line to `writer`, returning the number written
///
/// Output is flushed whenever the queue runs dry. A closed reader (broken
/// pipe) ends the task quietly; relaying carries on regardless.
pub fn spawn_writer<W>(writer: W, mut lines: UnboundedReceiver<String>) -> JoinHandle<io::Result<u64>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut out = BufWriter::new(writer);
        let mut written = 0;

        while let Some(line) = lines.recv().await {
            let result = async {
                out.write_all(line.as_bytes()).await?;
                out.write_all(b"\n").await?;
                if lines.is_empty() {
                    out.flush().await?;
                }
                Ok::<_, io::Error>(())
            }
            .await;

            match result {
                Ok(()) => written += 1,
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    debug!("observation reader went away");
                    return Ok(written);
                }
                Err(e) => return Err(e),
            }
        }

        out.flush().await?;
        Ok(written)
    })
}
