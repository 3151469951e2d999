// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Transparent Wayland relay for wl-trace
//!
//! Bytes and descriptors are forwarded verbatim between a client and the
//! compositor. A copy of every framed message is handed to an observer task
//! that owns all decoding state; decoding can never alter or stall the relay.

pub mod error;
pub mod fdpass;
pub mod observe;
pub mod proxy;
pub mod session;

pub use error::RelayError;
pub use observe::spawn_observer;
pub use proxy::{Proxy, ProxyEvent};
pub use session::{upstream_path, Session, SessionEvent, SessionState};
