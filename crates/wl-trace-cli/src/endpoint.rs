// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Where the compositor lives and where the proxy listens

use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use wl_trace_relay::upstream_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Real compositor socket
    pub upstream: PathBuf,
    /// Proxy socket, inside the runtime directory
    pub proxy: PathBuf,
    /// `WAYLAND_DISPLAY` value handed to the child
    pub display: String,
}

impl Endpoints {
    pub fn from_env(pid: u32) -> Result<Self> {
        Self::resolve(
            std::env::var_os("XDG_RUNTIME_DIR"),
            std::env::var_os("WAYLAND_DISPLAY"),
            pid,
        )
    }

    pub fn resolve(
        runtime_dir: Option<OsString>,
        display: Option<OsString>,
        pid: u32,
    ) -> Result<Self> {
        let runtime_dir = runtime_dir
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from)
            .context("XDG_RUNTIME_DIR not set")?;
        let display = display
            .filter(|name| !name.is_empty())
            .context("WAYLAND_DISPLAY not set")?;

        let name = format!("wl-trace-{pid}");
        Ok(Self {
            upstream: upstream_path(&runtime_dir, &display.to_string_lossy()),
            proxy: runtime_dir.join(&name),
            display: name,
        })
    }
}
