// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

// Capture file format for relayed traffic
//
// Layout (little-endian):
//   header: u32 magic 0x01020304, u16 disk format, u16 size shift
//   record: u32 word = (len << shift) | (session << 1) | side, then `len` raw bytes
//
// `side` is 0 for bytes sent by the client and 1 for bytes sent by the server.
// A record with `len == 0` marks that side of the session as disconnected.
// Raw bytes are stored exactly as they were read from the socket; framing is
// redone on replay.

use crate::message::Direction;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use thiserror::Error;

/// Magic marker written first so readers can reject foreign files
pub const CAPTURE_MAGIC: u32 = 0x0102_0304;

/// Current on-disk format version
pub const DISK_FORMAT: u16 = 1;

/// Default split between length and source bits (17 session bits + 1 side bit)
pub const DEFAULT_SIZE_SHIFT: u16 = 18;

/// How the magic reads when a capture was written big-endian
const SWAPPED_MAGIC: u32 = CAPTURE_MAGIC.swap_bytes();

/// Capture file errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("not a capture file: expected magic 0x01020304, got 0x{0:08X}")]
    BadMagic(u32),

    #[error("byte-swapped capture: only little-endian captures are supported")]
    ByteSwapped,

    #[error("unsupported capture format {0} (max supported: 1)")]
    UnsupportedFormat(u16),

    #[error("invalid size shift {0}")]
    InvalidShift(u16),

    #[error("session {session} does not fit in the capture's {bits} session bits")]
    SessionOutOfRange { session: u64, bits: u16 },

    #[error("capture truncated: expected {expected} bytes, only {actual} present")]
    Truncated { expected: usize, actual: usize },
}

/// One record read back from a capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// Bytes relayed from one side of a session
    Data {
        session: u64,
        direction: Direction,
        data: Vec<u8>,
    },
    /// That side of the session closed
    Closed { session: u64, direction: Direction },
}

impl CaptureEvent {
    pub fn session(&self) -> u64 {
        match self {
            CaptureEvent::Data { session, .. } | CaptureEvent::Closed { session, .. } => *session,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            CaptureEvent::Data { direction, .. } | CaptureEvent::Closed { direction, .. } => {
                *direction
            }
        }
    }
}

fn side_bit(direction: Direction) -> u32 {
    match direction {
        Direction::ClientToServer => 0,
        Direction::ServerToClient => 1,
    }
}

fn validate_shift(shift: u16) -> Result<(), CaptureError> {
    // at least one session bit plus the side bit, and room for some length
    if !(2..=31).contains(&shift) {
        return Err(CaptureError::InvalidShift(shift));
    }
    Ok(())
}

/// Writer for capture files
pub struct CaptureWriter<W: Write> {
    inner: W,
    shift: u16,
}

impl<W: Write> CaptureWriter<W> {
    /// Create a writer with the default layout and emit the file header
    pub fn new(inner: W) -> Result<Self, CaptureError> {
        Self::with_shift(inner, DEFAULT_SIZE_SHIFT)
    }

    /// Create a writer with an explicit size shift and emit the file header
    pub fn with_shift(mut inner: W, shift: u16) -> Result<Self, CaptureError> {
        validate_shift(shift)?;
        inner.write_u32::<LittleEndian>(CAPTURE_MAGIC)?;
        inner.write_u16::<LittleEndian>(DISK_FORMAT)?;
        inner.write_u16::<LittleEndian>(shift)?;
        Ok(Self { inner, shift })
    }

    /// Largest payload a single record can carry
    pub fn max_chunk(&self) -> usize {
        (1usize << (32 - self.shift)) - 1
    }

    fn source_bits(&self, session: u64, direction: Direction) -> Result<u32, CaptureError> {
        let session_bits = self.shift - 1;
        if session >= (1u64 << session_bits) {
            return Err(CaptureError::SessionOutOfRange {
                session,
                bits: session_bits,
            });
        }
        Ok(((session as u32) << 1) | side_bit(direction))
    }

    /// Record bytes relayed from one side; long chunks are split across records
    pub fn write_data(
        &mut self,
        session: u64,
        direction: Direction,
        data: &[u8],
    ) -> Result<(), CaptureError> {
        let source = self.source_bits(session, direction)?;
        for chunk in data.chunks(self.max_chunk()) {
            let word = ((chunk.len() as u32) << self.shift) | source;
            self.inner.write_u32::<LittleEndian>(word)?;
            self.inner.write_all(chunk)?;
        }
        Ok(())
    }

    /// Record that one side of a session disconnected
    pub fn write_closed(&mut self, session: u64, direction: Direction) -> Result<(), CaptureError> {
        let source = self.source_bits(session, direction)?;
        self.inner.write_u32::<LittleEndian>(source)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), CaptureError> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Sequential reader for capture files
pub struct CaptureReader<R: Read> {
    inner: R,
    shift: u16,
}

impl<R: Read> CaptureReader<R> {
    /// Read and validate the file header
    pub fn new(mut inner: R) -> Result<Self, CaptureError> {
        let magic = inner.read_u32::<LittleEndian>()?;
        if magic == SWAPPED_MAGIC {
            return Err(CaptureError::ByteSwapped);
        }
        if magic != CAPTURE_MAGIC {
            return Err(CaptureError::BadMagic(magic));
        }

        let format = inner.read_u16::<LittleEndian>()?;
        if format > DISK_FORMAT || format == 0 {
            return Err(CaptureError::UnsupportedFormat(format));
        }

        let shift = inner.read_u16::<LittleEndian>()?;
        validate_shift(shift)?;

        Ok(Self { inner, shift })
    }

    pub fn size_shift(&self) -> u16 {
        self.shift
    }

    /// Read the next record; `Ok(None)` at a clean end of file
    pub fn next_event(&mut self) -> Result<Option<CaptureEvent>, CaptureError> {
        let mut raw = [0u8; 4];
        let mut filled = 0;
        while filled < raw.len() {
            match self.inner.read(&mut raw[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        match filled {
            0 => return Ok(None),
            4 => {}
            actual => {
                return Err(CaptureError::Truncated {
                    expected: raw.len(),
                    actual,
                })
            }
        }
        let word = u32::from_le_bytes(raw);

        let source_mask = (1u32 << self.shift) - 1;
        let source = word & source_mask;
        let len = (word >> self.shift) as usize;
        let session = u64::from(source >> 1);
        let direction = if source & 1 == 1 {
            Direction::ServerToClient
        } else {
            Direction::ClientToServer
        };

        if len == 0 {
            return Ok(Some(CaptureEvent::Closed { session, direction }));
        }

        let mut data = Vec::with_capacity(len);
        let actual = (&mut self.inner).take(len as u64).read_to_end(&mut data)?;
        if actual < len {
            return Err(CaptureError::Truncated {
                expected: len,
                actual,
            });
        }

        Ok(Some(CaptureEvent::Data {
            session,
            direction,
            data,
        }))
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<CaptureEvent, CaptureError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
