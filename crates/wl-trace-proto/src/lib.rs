// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Wayland wire framing for wl-trace
//!
//! This crate knows nothing about interfaces or argument types. It only
//! splits a byte stream into messages (8-byte header + argument payload),
//! re-serializes them byte-for-byte, and reads/writes the capture file
//! format used to replay recorded sessions.

pub mod capture;
pub mod frame;
pub mod framer;
pub mod message;

// Re-export key types
pub use capture::{CaptureError, CaptureEvent, CaptureReader, CaptureWriter};
pub use frame::{Frame, FrameError, FrameHeader, HEADER_SIZE, MAX_FRAME_SIZE};
pub use framer::StreamFramer;
pub use message::{Direction, Message};
