// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Framed messages tagged with their direction and sequence number

use crate::frame::Frame;
use std::fmt;

/// Which side of the proxy a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Requests sent by the client application
    ClientToServer,
    /// Events sent by the compositor
    ServerToClient,
}

impl Direction {
    /// The opposite direction
    pub fn reverse(self) -> Self {
        match self {
            Direction::ClientToServer => Direction::ServerToClient,
            Direction::ServerToClient => Direction::ClientToServer,
        }
    }

    /// Label of the originating endpoint ("Client" or "Server")
    pub fn origin(self) -> &'static str {
        match self {
            Direction::ClientToServer => "Client",
            Direction::ServerToClient => "Server",
        }
    }

    /// "request" for client traffic, "event" for server traffic
    pub fn message_kind(self) -> &'static str {
        match self {
            Direction::ClientToServer => "request",
            Direction::ServerToClient => "event",
        }
    }

    /// Index usable for per-direction arrays
    pub fn index(self) -> usize {
        match self {
            Direction::ClientToServer => 0,
            Direction::ServerToClient => 1,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToServer => write!(f, "client->server"),
            Direction::ServerToClient => write!(f, "server->client"),
        }
    }
}

/// A single protocol message recovered from one direction of the stream
///
/// Only lives for the duration of a decode; sequence numbers are independent
/// per direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub direction: Direction,
    /// Monotonic per-direction sequence number, starting at 0
    pub seq: u64,
    pub frame: Frame,
}

impl Message {
    /// Sender (event) or receiver (request) object id
    pub fn object_id(&self) -> u32 {
        self.frame.header.object_id
    }

    /// Request or event index
    pub fn opcode(&self) -> u16 {
        self.frame.header.opcode
    }

    /// Raw argument bytes
    pub fn payload(&self) -> &[u8] {
        &self.frame.payload
    }
}
