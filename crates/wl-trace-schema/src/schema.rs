// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Signature lookup table
//!
//! A [`Schema`] maps interface names to their request/event definitions. It is
//! built once (built-in table plus any JSON tables) and is read-only afterwards.

use crate::error::{Result, SchemaError};
use crate::types::{ArgKind, Interface, MessageSignature, NewIdTarget};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};
use wl_trace_proto::Direction;

/// On-disk representation of a pre-indexed table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaTable {
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    interfaces: HashMap<String, Interface>,
}

impl Schema {
    /// An empty table; every lookup misses
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an interface, returning the definition it replaced
    pub fn insert(&mut self, interface: Interface) -> Option<Interface> {
        self.interfaces.insert(interface.name.clone(), interface)
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name)
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Look up the signature of one message
    ///
    /// Requests and events are indexed independently, so the direction is part
    /// of the key. `version` only gates whether the message existed yet; a miss
    /// for any reason is `None`, never an error.
    pub fn resolve(
        &self,
        interface: &str,
        version: u32,
        direction: Direction,
        index: u16,
    ) -> Option<&MessageSignature> {
        let iface = self.interfaces.get(interface)?;
        let messages = match direction {
            Direction::ClientToServer => &iface.requests,
            Direction::ServerToClient => &iface.events,
        };
        let message = messages.get(usize::from(index))?;
        if message.since > version {
            debug!(
                interface,
                version,
                message = %message.name,
                since = message.since,
                "message newer than object version"
            );
            return None;
        }
        Some(message)
    }

    /// Fold another table into this one; its interfaces win on name clashes
    pub fn merge(&mut self, other: Schema) {
        for (name, interface) in other.interfaces {
            if self.interfaces.insert(name.clone(), interface).is_some() {
                info!(interface = %name, "schema table overrides interface");
            }
        }
    }

    /// Parse and validate a JSON table
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self> {
        let table: SchemaTable = serde_json::from_reader(reader)?;
        Self::from_table(table)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: SchemaTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let schema = Self::from_json_reader(BufReader::new(file))?;
        debug!(path = %path.display(), interfaces = schema.len(), "loaded schema table");
        Ok(schema)
    }

    pub fn from_table(table: SchemaTable) -> Result<Self> {
        let mut schema = Schema::new();
        for interface in table.interfaces {
            validate_interface(&interface)?;
            schema.insert(interface);
        }
        Ok(schema)
    }

    /// Export as a serializable table, sorted by interface name
    pub fn to_table(&self) -> SchemaTable {
        let mut interfaces: Vec<Interface> = self.interfaces.values().cloned().collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        SchemaTable { interfaces }
    }
}

/// Check that companion-argument references point at usable slots
pub fn validate_interface(interface: &Interface) -> Result<()> {
    for message in interface.requests.iter().chain(interface.events.iter()) {
        let invalid = |reason: String| SchemaError::InvalidSignature {
            interface: interface.name.clone(),
            message: message.name.clone(),
            reason,
        };

        for (position, arg) in message.args.iter().enumerate() {
            let ArgKind::NewId(target) = &arg.kind else {
                continue;
            };
            let (interface_arg, version_arg) = match target {
                NewIdTarget::Typed { version_arg, .. } => (None, *version_arg),
                NewIdTarget::Dynamic {
                    interface_arg,
                    version_arg,
                } => (Some(*interface_arg), Some(*version_arg)),
            };

            if let Some(index) = interface_arg {
                match message.args.get(index) {
                    Some(companion)
                        if index < position
                            && matches!(companion.kind, ArgKind::String { .. }) => {}
                    _ => {
                        return Err(invalid(format!(
                            "argument '{}' expects a preceding string at index {}",
                            arg.name, index
                        )))
                    }
                }
            }
            if let Some(index) = version_arg {
                match message.args.get(index) {
                    Some(companion) if index < position && companion.kind == ArgKind::Uint => {}
                    _ => {
                        return Err(invalid(format!(
                            "argument '{}' expects a preceding uint at index {}",
                            arg.name, index
                        )))
                    }
                }
            }
        }
    }
    Ok(())
}
