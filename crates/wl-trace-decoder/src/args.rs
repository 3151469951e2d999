// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Argument payload reader
//!
//! Every wire argument is a multiple of 4 bytes. Strings and arrays carry a
//! u32 length followed by the content padded to the next 4-byte boundary;
//! string lengths include the trailing NUL and a length of 0 means null.

use crate::warning::ArgError;
use byteorder::{ByteOrder, LittleEndian};

pub struct ArgCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

impl<'a> ArgCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ArgError> {
        if self.remaining() < len {
            let available = self.remaining();
            // nothing after a short read can be trusted
            self.pos = self.data.len();
            return Err(ArgError::Truncated {
                needed: len,
                available,
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_u32(&mut self) -> Result<u32, ArgError> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_i32(&mut self) -> Result<i32, ArgError> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    /// Length-prefixed, padded byte run
    pub fn read_array(&mut self) -> Result<Vec<u8>, ArgError> {
        let len = self.read_u32()? as usize;
        let body = self.take(padded(len))?;
        Ok(body[..len].to_vec())
    }

    /// Length-prefixed string; `None` for the null string
    pub fn read_string(&mut self) -> Result<Option<Vec<u8>>, ArgError> {
        let len = self.read_u32()? as usize;
        if len == 0 {
            return Ok(None);
        }
        let body = self.take(padded(len))?;
        let content = &body[..len];
        match content.split_last() {
            Some((0, text)) => Ok(Some(text.to_vec())),
            _ => Err(ArgError::MissingTerminator),
        }
    }
}
