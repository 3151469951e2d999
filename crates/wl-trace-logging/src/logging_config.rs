// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging section of the wl-trace config file

use crate::{CliLogLevel, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging verbosity level
    #[serde(rename = "log-level", default)]
    pub level: Option<CliLogLevel>,
    #[serde(rename = "log-format", default)]
    pub format: Option<LogFormat>,
    #[serde(rename = "log-file", default)]
    pub file: Option<PathBuf>,
}
