// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Globals announced by the registry
//!
//! Global names are their own namespace and never enter the object registry.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Global {
    pub name: u32,
    pub interface: String,
    pub version: u32,
}

#[derive(Debug, Default)]
pub struct Globals {
    entries: BTreeMap<u32, Global>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announce(&mut self, name: u32, interface: &str, version: u32) {
        self.entries.insert(
            name,
            Global {
                name,
                interface: interface.to_string(),
                version,
            },
        );
    }

    pub fn remove(&mut self, name: u32) -> Option<Global> {
        self.entries.remove(&name)
    }

    pub fn get(&self, name: u32) -> Option<&Global> {
        self.entries.get(&name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
