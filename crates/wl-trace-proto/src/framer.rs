// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Incremental framing over a byte stream
//!
//! Socket reads do not respect message boundaries, so each direction keeps its
//! own framer that buffers leftovers until a complete frame is available.
//! The framer never blocks: it only looks at bytes already pushed into it.

use crate::frame::{Frame, FrameError};
use crate::message::{Direction, Message};
use tracing::trace;

/// Per-direction stream framer
#[derive(Debug)]
pub struct StreamFramer {
    direction: Direction,
    buf: Vec<u8>,
    next_seq: u64,
}

impl StreamFramer {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            buf: Vec::with_capacity(4096),
            next_seq: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Bytes buffered but not yet part of a complete frame
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Sequence number the next message will receive
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Append freshly read bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Pop the next complete message, if any
    ///
    /// `Ok(None)` means more data is needed. A `MalformedFrame` error leaves the
    /// buffer untouched; the stream cannot be resynchronised after it.
    pub fn next_message(&mut self) -> Result<Option<Message>, FrameError> {
        match Frame::parse(&self.buf) {
            Ok((frame, used)) => {
                self.buf.drain(..used);
                let seq = self.next_seq;
                self.next_seq += 1;
                trace!(
                    direction = %self.direction,
                    seq,
                    object_id = frame.header.object_id,
                    opcode = frame.header.opcode,
                    len = used,
                    "framed message"
                );
                Ok(Some(Message {
                    direction: self.direction,
                    seq,
                    frame,
                }))
            }
            Err(FrameError::NeedMoreData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Push `data` and return every message that is now complete
    pub fn feed(&mut self, data: &[u8]) -> Result<Vec<Message>, FrameError> {
        self.push(data);
        let mut messages = Vec::new();
        while let Some(message) = self.next_message()? {
            messages.push(message);
        }
        Ok(messages)
    }
}
