// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Failures with a dedicated process exit status

use std::path::PathBuf;
use thiserror::Error;
use wl_trace_relay::RelayError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_TARGET_NOT_FOUND: u8 = 2;
pub const EXIT_UPSTREAM_UNREACHABLE: u8 = 3;

#[derive(Error, Debug)]
pub enum TraceFailure {
    #[error("program '{program}' not found")]
    TargetNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("failed to start {}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("compositor socket {} unreachable", path.display())]
    UpstreamUnreachable { path: PathBuf },
}

impl TraceFailure {
    pub fn exit_code(&self) -> u8 {
        match self {
            TraceFailure::TargetNotFound { .. } | TraceFailure::Spawn { .. } => {
                EXIT_TARGET_NOT_FOUND
            }
            TraceFailure::UpstreamUnreachable { .. } => EXIT_UPSTREAM_UNREACHABLE,
        }
    }
}

/// Map any error reaching `main` to the process exit status
pub fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(failure) = error.downcast_ref::<TraceFailure>() {
        return failure.exit_code();
    }
    if let Some(RelayError::UpstreamUnavailable { .. }) = error.downcast_ref::<RelayError>() {
        return EXIT_UPSTREAM_UNREACHABLE;
    }
    EXIT_FAILURE
}
