// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Live object table
//!
//! Object ids get their meaning only from the traffic that created them, so
//! the decoder keeps a runtime map from id to interface/version. Client and
//! server share one id space per connection, hence one registry per session.

use crate::warning::DecodeWarning;
use std::collections::HashMap;
use tracing::debug;
use wl_trace_schema::DISPLAY_INTERFACE;

/// Id of the root object, bound before any traffic
pub const DISPLAY_ID: u32 = 1;

/// First id in the server-allocated range
pub const SERVER_ID_BASE: u32 = 0xff00_0000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRecord {
    pub id: u32,
    pub interface: String,
    pub version: u32,
    /// Sequence number of the message that created the object
    pub created_at: u64,
}

impl ObjectRecord {
    pub fn is_server_allocated(&self) -> bool {
        self.id >= SERVER_ID_BASE
    }
}

#[derive(Debug)]
pub struct Registry {
    objects: HashMap<u32, ObjectRecord>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry holding only the root object
    pub fn new() -> Self {
        let mut objects = HashMap::new();
        objects.insert(
            DISPLAY_ID,
            ObjectRecord {
                id: DISPLAY_ID,
                interface: DISPLAY_INTERFACE.to_string(),
                version: 1,
                created_at: 0,
            },
        );
        Self { objects }
    }

    /// Bind `id` to an interface
    ///
    /// A live record is overwritten anyway (the stream is authoritative) and
    /// reported as `DoubleBind`. The root object cannot be rebound.
    pub fn bind(
        &mut self,
        id: u32,
        interface: &str,
        version: u32,
        created_at: u64,
    ) -> Result<(), DecodeWarning> {
        let record = ObjectRecord {
            id,
            interface: interface.to_string(),
            version,
            created_at,
        };

        if id == DISPLAY_ID {
            return Err(DecodeWarning::DoubleBind {
                id,
                existing: DISPLAY_INTERFACE.to_string(),
                new: record.interface,
            });
        }

        debug!(id, interface, version, "bind object");
        match self.objects.insert(id, record) {
            Some(previous) => Err(DecodeWarning::DoubleBind {
                id,
                existing: previous.interface,
                new: interface.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn resolve(&self, id: u32) -> Option<&ObjectRecord> {
        self.objects.get(&id)
    }

    /// Retire `id` so it can be reused; the root object is never released
    pub fn release(&mut self, id: u32) -> Option<ObjectRecord> {
        if id == DISPLAY_ID {
            debug!("ignoring release of the display object");
            return None;
        }
        let removed = self.objects.remove(&id);
        match &removed {
            Some(record) => debug!(id, interface = %record.interface, "release object"),
            None => debug!(id, "release of an id that is not live"),
        }
        removed
    }

    /// Number of live objects, root included
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRecord> {
        self.objects.values()
    }
}
