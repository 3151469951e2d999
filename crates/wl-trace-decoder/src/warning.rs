// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use wl_trace_proto::Direction;

/// Why a single argument could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("needs {needed} bytes, only {available} left")]
    Truncated { needed: usize, available: usize },

    #[error("string is missing its NUL terminator")]
    MissingTerminator,

    #[error("companion argument {index} is missing or not a {expected}")]
    BadCompanion { index: usize, expected: &'static str },
}

/// Non-fatal conditions noticed while decoding
///
/// None of these stop decoding or affect the relayed bytes; the record is
/// still produced with best-effort placeholders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeWarning {
    #[error("object {id} bound as {new} while still live as {existing}")]
    DoubleBind {
        id: u32,
        existing: String,
        new: String,
    },

    #[error("{direction} message {opcode} addressed to unknown object {id}")]
    UnknownObject {
        id: u32,
        opcode: u16,
        direction: Direction,
    },

    #[error("{interface}.{message} {kind} argument '{arg}': {reason}")]
    MalformedArgument {
        interface: String,
        message: String,
        arg: String,
        kind: &'static str,
        reason: ArgError,
    },

    #[error("{direction}: messages declared {expected} descriptors but {received} arrived")]
    FdMismatch {
        direction: Direction,
        expected: u64,
        received: u64,
    },
}
