// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Message frame codec
//!
//! Wire format (all fields little-endian):
//!
//! ```text
//! ┌─────────────┬──────────────────────────────┬──────────────────────┐
//! │  object_id  │ (length << 16) | opcode      │  arguments           │
//! │  (4 bytes)  │ (4 bytes)                    │  (length - 8 bytes)  │
//! └─────────────┴──────────────────────────────┴──────────────────────┘
//! ```
//!
//! `length` counts the whole message including the header, so it can never be
//! smaller than [`HEADER_SIZE`] and never larger than [`MAX_FRAME_SIZE`].

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::io::{self, Write};
use thiserror::Error;

/// Size of the fixed message header in bytes
pub const HEADER_SIZE: usize = 8;

/// Largest message the 16-bit length field can describe
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Framing errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Not an error as such: the buffer does not yet hold a full frame
    #[error("need more data: have {available} bytes, frame needs {needed}")]
    NeedMoreData { available: usize, needed: usize },

    /// The header declares a length that cannot hold the header itself
    #[error("malformed frame for object {object_id}: declared length {length} is below the 8-byte header")]
    MalformedFrame { object_id: u32, length: u16 },

    /// The payload does not fit the 16-bit length field
    #[error("payload of {len} bytes does not fit in a single frame")]
    Oversized { len: usize },
}

impl FrameError {
    /// True for the incomplete-buffer case, which callers retry after the next read
    pub fn is_need_more_data(&self) -> bool {
        matches!(self, FrameError::NeedMoreData { .. })
    }
}

/// Fixed 8-byte message header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHeader {
    /// Sender (event) or receiver (request) object id
    pub object_id: u32,
    /// Request or event index within the object's interface
    pub opcode: u16,
    /// Total message length including this header
    pub length: u16,
}

impl FrameHeader {
    /// Build a header for a payload of the given size
    pub fn for_payload(object_id: u32, opcode: u16, payload_len: usize) -> Result<Self, FrameError> {
        let total = payload_len + HEADER_SIZE;
        if total > MAX_FRAME_SIZE {
            return Err(FrameError::Oversized { len: payload_len });
        }
        Ok(Self {
            object_id,
            opcode,
            length: total as u16,
        })
    }

    /// Parse a header from the start of `src` without consuming anything
    pub fn parse(src: &[u8]) -> Result<Self, FrameError> {
        if src.len() < HEADER_SIZE {
            return Err(FrameError::NeedMoreData {
                available: src.len(),
                needed: HEADER_SIZE,
            });
        }

        let object_id = LittleEndian::read_u32(&src[0..4]);
        let size_opcode = LittleEndian::read_u32(&src[4..8]);
        let length = (size_opcode >> 16) as u16;
        let opcode = (size_opcode & 0xFFFF) as u16;

        if (length as usize) < HEADER_SIZE {
            return Err(FrameError::MalformedFrame { object_id, length });
        }

        Ok(Self {
            object_id,
            opcode,
            length,
        })
    }

    /// Number of argument bytes following the header
    pub fn payload_len(&self) -> usize {
        self.length as usize - HEADER_SIZE
    }

    fn size_opcode(&self) -> u32 {
        (u32::from(self.length) << 16) | u32::from(self.opcode)
    }

    /// Write the header to a writer
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_u32::<LittleEndian>(self.object_id)?;
        w.write_u32::<LittleEndian>(self.size_opcode())?;
        Ok(())
    }

    /// Serialize into an 8-byte array
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        LittleEndian::write_u32(&mut out[0..4], self.object_id);
        LittleEndian::write_u32(&mut out[4..8], self.size_opcode());
        out
    }
}

/// One complete message: header plus raw argument bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a frame, computing the length field from the payload
    pub fn new(object_id: u32, opcode: u16, payload: Vec<u8>) -> Result<Self, FrameError> {
        let header = FrameHeader::for_payload(object_id, opcode, payload.len())?;
        Ok(Self { header, payload })
    }

    /// Try to read exactly one frame from the start of `src`
    ///
    /// Returns the frame and the number of bytes it occupied. Never consumes
    /// partial frames: if `src` is short, `NeedMoreData` reports how many bytes
    /// the frame needs in total.
    pub fn parse(src: &[u8]) -> Result<(Self, usize), FrameError> {
        let header = FrameHeader::parse(src)?;
        let total = header.length as usize;
        if src.len() < total {
            return Err(FrameError::NeedMoreData {
                available: src.len(),
                needed: total,
            });
        }

        let frame = Self {
            header,
            payload: src[HEADER_SIZE..total].to_vec(),
        };
        Ok((frame, total))
    }

    /// Total encoded size in bytes
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Write the frame to a writer, byte-for-byte as it appeared on the wire
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        self.header.write_to(&mut w)?;
        w.write_all(&self.payload)?;
        Ok(())
    }

    /// Serialize into a fresh buffer
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.payload);
        out
    }
}
