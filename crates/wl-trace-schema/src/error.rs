// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while loading or validating signature tables
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to read schema table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid schema table JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid signature {interface}.{message}: {reason}")]
    InvalidSignature {
        interface: String,
        message: String,
        reason: String,
    },
}
