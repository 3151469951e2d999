// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Decoded argument values and their textual rendering

use std::fmt::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Int(i32),
    Uint(u32),
    /// Raw signed 24.8 value
    Fixed(i32),
    /// String contents without the terminator; `None` is a null string
    Str(Option<Vec<u8>>),
    Array(Vec<u8>),
    /// Object reference with the interface bound at decode time
    Object {
        id: u32,
        interface: Option<String>,
    },
    NewId {
        id: u32,
        interface: Option<String>,
    },
    Fd,
    /// Payload of a message with no known signature
    Opaque(Vec<u8>),
    Malformed,
}

impl ArgValue {
    /// Text of a string argument, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Str(Some(bytes)) => std::str::from_utf8(bytes).ok(),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            ArgValue::Uint(value) => Some(*value),
            _ => None,
        }
    }
}

/// Value of a 24.8 fixed-point number
pub fn fixed_to_f64(raw: i32) -> f64 {
    f64::from(raw) / 256.0
}

/// Render bytes as a `b'...'` literal
pub fn byte_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 3);
    out.push_str("b'");
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\t' => out.push_str("\\t"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(byte as char),
            _ => {
                let _ = write!(out, "\\x{byte:02x}");
            }
        }
    }
    out.push('\'');
    out
}

fn quoted_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.extend(c.escape_unicode()),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn object_ref(f: &mut fmt::Formatter<'_>, id: u32, interface: &Option<String>) -> fmt::Result {
    match interface {
        Some(interface) => write!(f, "{interface}@{id}"),
        None => write!(f, "{id}"),
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Int(value) => write!(f, "{value}"),
            ArgValue::Uint(value) => write!(f, "{value}"),
            ArgValue::Fixed(raw) => write!(f, "{}", fixed_to_f64(*raw)),
            ArgValue::Str(None) => f.write_str("null"),
            ArgValue::Str(Some(bytes)) => match std::str::from_utf8(bytes) {
                Ok(text) => f.write_str(&quoted_text(text)),
                Err(_) => f.write_str(&byte_literal(bytes)),
            },
            ArgValue::Array(bytes) | ArgValue::Opaque(bytes) => f.write_str(&byte_literal(bytes)),
            ArgValue::Object { id: 0, .. } => f.write_str("null"),
            ArgValue::Object { id, interface } => object_ref(f, *id, interface),
            ArgValue::NewId { id, interface } => {
                f.write_str("new ")?;
                object_ref(f, *id, interface)
            }
            ArgValue::Fd => f.write_str("fd"),
            ArgValue::Malformed => f.write_str("<malformed>"),
        }
    }
}
