// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;
use thiserror::Error;
use wl_trace_proto::{CaptureError, Direction, FrameError};

/// Errors that end a session or the proxy itself
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("compositor socket {path} is unreachable: {source}")]
    UpstreamUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot listen on {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session {session} {direction}: {source}")]
    Framing {
        session: u64,
        direction: Direction,
        #[source]
        source: FrameError,
    },

    #[error("capture file: {0}")]
    Capture(#[from] CaptureError),
}
