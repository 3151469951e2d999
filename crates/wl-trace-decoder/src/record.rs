// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use crate::value::ArgValue;
use std::fmt;
use wl_trace_proto::Direction;

/// What the decoder could tell about a message's identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Resolved { interface: String, message: String },
    /// Bound object, but no signature for this index at its version
    UnknownMessage { interface: String, index: u16 },
    /// The target id has no live registry entry
    UnknownObject { index: u16 },
}

/// One decoded message, ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRecord {
    pub seq: u64,
    pub direction: Direction,
    pub object_id: u32,
    pub kind: MessageKind,
    pub args: Vec<ArgValue>,
}

impl DecodedRecord {
    /// `interface.message`, or `interface.index` / `id.index` when unresolved
    pub fn message_kind(&self) -> String {
        match &self.kind {
            MessageKind::Resolved { interface, message } => format!("{interface}.{message}"),
            MessageKind::UnknownMessage { interface, index } => format!("{interface}.{index}"),
            MessageKind::UnknownObject { index } => format!("{}.{index}", self.object_id),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.kind, MessageKind::Resolved { .. })
    }

    pub fn rendered_args(&self) -> Vec<String> {
        self.args.iter().map(ToString::to_string).collect()
    }

    /// `<id> <kind>(<args>)`, the observation line for this record
    pub fn render_line(&self) -> String {
        format!(
            "{} {}({})",
            self.object_id,
            self.message_kind(),
            self.rendered_args().join(", ")
        )
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_line())
    }
}
