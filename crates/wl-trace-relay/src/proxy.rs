// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Proxy listener
//!
//! Accepts clients on a fresh socket and runs one [`Session`] task per client.
//! The caller drives it with [`Proxy::next_event`] so it can interleave child
//! process supervision and signal handling.

use crate::error::RelayError;
use crate::session::{Session, SessionEvent};
use nix::errno::Errno;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Pause after a transient accept failure so descriptor exhaustion cannot spin
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Lifecycle notifications from the proxy
#[derive(Debug)]
pub enum ProxyEvent {
    Accepted { session: u64 },
    Finished {
        session: u64,
        result: Result<(), RelayError>,
    },
}

pub struct Proxy {
    listener: UnixListener,
    socket_path: PathBuf,
    upstream_path: PathBuf,
    events: UnboundedSender<SessionEvent>,
    sessions: JoinSet<(u64, Result<(), RelayError>)>,
    next_session: u64,
    stop: watch::Sender<bool>,
}

impl Proxy {
    /// Listen on `socket_path`, relaying every client to `upstream_path`
    ///
    /// A stale socket file at `socket_path` is replaced.
    pub fn bind(
        socket_path: impl Into<PathBuf>,
        upstream_path: impl Into<PathBuf>,
        events: UnboundedSender<SessionEvent>,
    ) -> Result<Self, RelayError> {
        let socket_path = socket_path.into();
        if socket_path.exists() {
            debug!(path = %socket_path.display(), "removing stale socket");
            std::fs::remove_file(&socket_path).map_err(|source| RelayError::Bind {
                path: socket_path.clone(),
                source,
            })?;
        }

        let listener = UnixListener::bind(&socket_path).map_err(|source| RelayError::Bind {
            path: socket_path.clone(),
            source,
        })?;
        info!(path = %socket_path.display(), "proxy listening");

        Ok(Self {
            listener,
            socket_path,
            upstream_path: upstream_path.into(),
            events,
            sessions: JoinSet::new(),
            next_session: 0,
            stop: watch::Sender::new(false),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sessions that have not reached `Closed` yet
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Wait for the next accepted client or finished session
    ///
    /// Transient accept failures are logged and retried; live sessions keep
    /// relaying through them.
    pub async fn next_event(&mut self) -> Result<ProxyEvent, RelayError> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((client, _addr)) => return Ok(self.start_session(client)),
                    Err(e) if is_transient_accept_error(&e) => {
                        warn!("accept failed, retrying: {e}");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                    }
                    Err(e) => return Err(e.into()),
                },
                Some(joined) = self.sessions.join_next(), if !self.sessions.is_empty() => {
                    return match joined {
                        Ok((session, result)) => Ok(ProxyEvent::Finished { session, result }),
                        Err(e) => {
                            warn!("session task failed: {e}");
                            Err(RelayError::Io(io::Error::other(e)))
                        }
                    };
                }
            }
        }
    }

    fn start_session(&mut self, client: UnixStream) -> ProxyEvent {
        let session = self.next_session;
        self.next_session += 1;
        info!(session, "client connected");

        let upstream = self.upstream_path.clone();
        let events = self.events.clone();
        let stop = self.stop.subscribe();
        self.sessions.spawn(async move {
            let mut relay = Session::new(session, client, upstream);
            let result = relay.run(&events, stop).await;
            (session, result)
        });
        ProxyEvent::Accepted { session }
    }

    /// Ask every running session to close and wait until they have
    ///
    /// Sessions take their normal close path, so the observer still sees
    /// `Closed` for both directions of each one.
    pub async fn shutdown(&mut self) {
        self.stop.send_replace(true);
        while let Some(joined) = self.sessions.join_next().await {
            match joined {
                Ok((session, Ok(()))) => debug!(session, "session stopped"),
                Ok((session, Err(e))) => debug!(session, "session ended during shutdown: {e}"),
                Err(e) => warn!("session task failed: {e}"),
            }
        }
    }
}

/// Accept errors that leave the listener usable
fn is_transient_accept_error(error: &io::Error) -> bool {
    let Some(raw) = error.raw_os_error() else {
        return false;
    };
    matches!(
        Errno::from_raw(raw),
        Errno::EMFILE
            | Errno::ENFILE
            | Errno::ENOBUFS
            | Errno::ENOMEM
            | Errno::ECONNABORTED
            | Errno::EINTR
            | Errno::EPROTO
            | Errno::EPERM
    )
}

impl Drop for Proxy {
    fn drop(&mut self) {
        if self.socket_path.exists() {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_accept_errors() {
        for errno in [Errno::EMFILE, Errno::ENFILE, Errno::ECONNABORTED, Errno::EINTR] {
            assert!(
                is_transient_accept_error(&io::Error::from(errno)),
                "{errno} should be retried"
            );
        }
        assert!(!is_transient_accept_error(&io::Error::from(Errno::EBADF)));
        assert!(!is_transient_accept_error(&io::Error::from(Errno::EINVAL)));
        assert!(!is_transient_accept_error(&io::Error::other("not an os error")));
    }
}
