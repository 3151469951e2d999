// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! One client connection and its compositor link
//!
//! ```text
//! Listening ──upstream connected──▶ Connected ──either side ends──▶ Closing ──▶ Closed
//! ```
//!
//! While connected, two forwarding loops run concurrently, one per direction.
//! Each owns a private framer; the bytes it forwards never depend on what the
//! framer makes of them. A stop request takes the same `Closing` path as a
//! side ending on its own.

use crate::error::RelayError;
use crate::fdpass::{recv_chunk, send_chunk, READ_BUF_SIZE};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tracing::{debug, error, info};
use wl_trace_proto::{Direction, Message, StreamFramer};

/// Lifecycle of a relay session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Client accepted, compositor link not yet open
    Listening,
    Connected,
    Closing,
    /// Terminal
    Closed,
}

/// Traffic notifications sent to the observer
#[derive(Debug)]
pub enum SessionEvent {
    /// One socket read, after it was forwarded
    Chunk {
        session: u64,
        direction: Direction,
        /// Bytes exactly as read
        data: Vec<u8>,
        /// Messages completed by this read
        messages: Vec<Message>,
        /// Descriptors that arrived with the read
        fds: usize,
    },
    /// The forwarding loop for this direction stopped
    Closed { session: u64, direction: Direction },
}

pub struct Session {
    id: u64,
    state: SessionState,
    client: UnixStream,
    upstream_path: PathBuf,
}

impl Session {
    pub fn new(id: u64, client: UnixStream, upstream_path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            state: SessionState::Listening,
            client,
            upstream_path: upstream_path.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!(session = self.id, from = ?self.state, to = ?next, "session state");
        self.state = next;
    }

    /// Relay until either side ends or `stop` turns true
    ///
    /// Always leaves the session `Closed` and reports `Closed` for both
    /// directions once connected. An unreachable compositor fails with
    /// `UpstreamUnavailable` before any client byte is read.
    pub async fn run(
        &mut self,
        events: &UnboundedSender<SessionEvent>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), RelayError> {
        let upstream = match UnixStream::connect(&self.upstream_path).await {
            Ok(stream) => stream,
            Err(source) => {
                error!(session = self.id, path = %self.upstream_path.display(), "compositor unreachable: {source}");
                self.transition(SessionState::Closed);
                return Err(RelayError::UpstreamUnavailable {
                    path: self.upstream_path.clone(),
                    source,
                });
            }
        };
        self.transition(SessionState::Connected);
        info!(session = self.id, upstream = %self.upstream_path.display(), "session connected");

        let id = self.id;
        let ended = {
            let client = &self.client;
            let upstream = &upstream;
            tokio::select! {
                result = forward(id, Direction::ClientToServer, client, upstream, events) => {
                    Some((Direction::ClientToServer, result))
                }
                result = forward(id, Direction::ServerToClient, upstream, client, events) => {
                    Some((Direction::ServerToClient, result))
                }
                _ = stop_requested(&mut stop) => None,
            }
        };
        self.transition(SessionState::Closing);

        let (first, result) = match ended {
            Some((first, result)) => {
                match &result {
                    Ok(()) => info!(session = id, side = first.origin(), "connection closed"),
                    Err(e) => error!(session = id, direction = %first, "relay stopped: {e}"),
                }
                (first, result)
            }
            None => {
                info!(session = id, "session stopped");
                (Direction::ClientToServer, Ok(()))
            }
        };

        shutdown(&mut self.client).await;
        let mut upstream = upstream;
        shutdown(&mut upstream).await;

        for direction in [first, first.reverse()] {
            let _ = events.send(SessionEvent::Closed {
                session: id,
                direction,
            });
        }
        self.transition(SessionState::Closed);
        result
    }
}

/// Resolves once `stop` reads true or its sender is gone
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    let _ = stop.wait_for(|stopped| *stopped).await;
}

async fn shutdown(stream: &mut UnixStream) {
    if let Err(e) = stream.shutdown().await {
        debug!("socket shutdown: {e}");
    }
}

/// Copy one direction until end of stream, mirroring framed messages
async fn forward(
    session: u64,
    direction: Direction,
    from: &UnixStream,
    to: &UnixStream,
    events: &UnboundedSender<SessionEvent>,
) -> Result<(), RelayError> {
    let mut framer = StreamFramer::new(direction);
    let mut buf = vec![0u8; READ_BUF_SIZE];

    loop {
        let (n, fds) = recv_chunk(from, &mut buf).await?;
        if n == 0 {
            debug!(session, %direction, "end of stream");
            return Ok(());
        }
        let data = &buf[..n];
        send_chunk(to, data, &fds).await?;
        let fd_count = fds.len();
        drop(fds);

        framer.push(data);
        let mut messages = Vec::new();
        let framing = loop {
            match framer.next_message() {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => break Ok(()),
                Err(source) => break Err(source),
            }
        };

        // observer gone means nobody is watching; keep relaying
        let _ = events.send(SessionEvent::Chunk {
            session,
            direction,
            data: data.to_vec(),
            messages,
            fds: fd_count,
        });

        framing.map_err(|source| RelayError::Framing {
            session,
            direction,
            source,
        })?;
    }
}

/// Resolve the compositor socket like libwayland does
///
/// An absolute `display` is used as is, otherwise it is relative to
/// `runtime_dir`.
pub fn upstream_path(runtime_dir: &Path, display: &str) -> PathBuf {
    let display = Path::new(display);
    if display.is_absolute() {
        display.to_path_buf()
    } else {
        runtime_dir.join(display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn test_upstream_path() {
        let runtime = Path::new("/run/user/1000");
        assert_eq!(
            upstream_path(runtime, "wayland-0"),
            PathBuf::from("/run/user/1000/wayland-0")
        );
        assert_eq!(
            upstream_path(runtime, "/tmp/compositor.sock"),
            PathBuf::from("/tmp/compositor.sock")
        );
    }

    #[tokio::test]
    async fn test_unreachable_upstream_closes_session() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _peer) = UnixStream::pair().unwrap();
        let mut session = Session::new(0, client, dir.path().join("missing"));
        assert_eq!(session.state(), SessionState::Listening);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_stop_tx, stop_rx) = watch::channel(false);
        let err = session.run(&tx, stop_rx).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnavailable { .. }));
        assert_eq!(session.state(), SessionState::Closed);
        drop(tx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_request_closes_both_directions() {
        let dir = tempfile::tempdir().unwrap();
        let upstream_path = dir.path().join("compositor");
        let listener = tokio::net::UnixListener::bind(&upstream_path).unwrap();
        let (client, _peer) = UnixStream::pair().unwrap();
        let mut session = Session::new(4, client, &upstream_path);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        let relay = tokio::spawn(async move {
            let result = session.run(&tx, stop_rx).await;
            (session.state(), result)
        });

        let (_compositor, _addr) = listener.accept().await.unwrap();
        stop_tx.send_replace(true);
        let (state, result) = relay.await.unwrap();
        assert!(result.is_ok());
        assert_eq!(state, SessionState::Closed);

        let mut closed = Vec::new();
        while let Some(event) = rx.recv().await {
            if let SessionEvent::Closed { session, direction } = event {
                closed.push((session, direction));
            }
        }
        assert_eq!(
            closed,
            vec![
                (4, Direction::ClientToServer),
                (4, Direction::ServerToClient)
            ]
        );
    }
}
