// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Observer task: the single owner of all decoding state
//!
//! Forwarding loops only ever talk to it through an unbounded channel, so
//! registry updates from both directions of a session are applied in one
//! place, in arrival order.

use crate::error::RelayError;
use crate::session::SessionEvent;
use std::io::Write;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use wl_trace_decoder::{Observer, Source};
use wl_trace_proto::CaptureWriter;

/// Records raw traffic to a capture file, disabling itself on the first error
struct CaptureSink<W: Write> {
    writer: Option<CaptureWriter<W>>,
}

impl<W: Write> CaptureSink<W> {
    fn record(&mut self, event: &SessionEvent) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        let result = match event {
            SessionEvent::Chunk {
                session,
                direction,
                data,
                ..
            } => writer.write_data(*session, *direction, data),
            SessionEvent::Closed { session, direction } => writer
                .write_closed(*session, *direction)
                .and_then(|()| writer.flush()),
        };
        if let Err(e) = result {
            warn!("{}; capture stopped", RelayError::from(e));
            self.writer = None;
        }
    }

    fn finish(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                warn!("capture flush failed: {e}");
            }
        }
    }
}

/// Spawn the observer task
///
/// Rendered lines go to `output`. The task ends once every event sender
/// (proxy and sessions) has been dropped.
pub fn spawn_observer<W>(
    mut observer: Observer,
    capture: Option<CaptureWriter<W>>,
    mut events: UnboundedReceiver<SessionEvent>,
    output: UnboundedSender<String>,
) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    tokio::spawn(async move {
        let mut sink = CaptureSink { writer: capture };

        while let Some(event) = events.recv().await {
            sink.record(&event);
            let lines = match event {
                SessionEvent::Chunk {
                    session,
                    direction,
                    messages,
                    fds,
                    ..
                } => observer.on_messages(Source::new(session, direction), &messages, Some(fds)),
                SessionEvent::Closed { session, direction } => {
                    observer.on_closed(Source::new(session, direction))
                }
            };
            for line in lines {
                if output.send(line).is_err() {
                    debug!("observation output closed");
                }
            }
        }

        sink.finish();
        debug!("observer finished");
    })
}
