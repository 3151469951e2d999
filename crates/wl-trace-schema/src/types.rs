// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Message signature data model

use serde::{Deserialize, Serialize};

/// How a new-object argument learns its interface and version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewIdTarget {
    /// Interface fixed by the signature
    ///
    /// The version comes from the uint argument at `version_arg` when given,
    /// otherwise it is inherited from the object that sent the message.
    Typed {
        interface: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version_arg: Option<usize>,
    },
    /// Interface and version carried by companion arguments of the same message
    Dynamic {
        interface_arg: usize,
        version_arg: usize,
    },
}

/// Wire type of a single argument slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    Int,
    Uint,
    Fixed,
    String {
        #[serde(default)]
        nullable: bool,
    },
    Array,
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interface: Option<String>,
        #[serde(default)]
        nullable: bool,
    },
    NewId(NewIdTarget),
    Fd,
}

impl ArgKind {
    /// Short type tag used in diagnostics
    pub fn tag(&self) -> &'static str {
        match self {
            ArgKind::Int => "int",
            ArgKind::Uint => "uint",
            ArgKind::Fixed => "fixed",
            ArgKind::String { .. } => "string",
            ArgKind::Array => "array",
            ArgKind::Object { .. } => "object",
            ArgKind::NewId(_) => "new_id",
            ArgKind::Fd => "fd",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    pub kind: ArgKind,
}

fn default_since() -> u32 {
    1
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One request or event definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSignature {
    pub name: String,
    /// First interface version that carries this message
    #[serde(default = "default_since")]
    pub since: u32,
    /// Sending this message retires the sender object
    #[serde(default, skip_serializing_if = "is_false")]
    pub destructor: bool,
    #[serde(default)]
    pub args: Vec<Arg>,
}

impl MessageSignature {
    pub fn new(name: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            name: name.into(),
            since: 1,
            destructor: false,
            args,
        }
    }

    pub fn since(mut self, version: u32) -> Self {
        self.since = version;
        self
    }

    pub fn destructor(mut self) -> Self {
        self.destructor = true;
        self
    }

    /// Number of descriptors that travel out-of-band with this message
    pub fn fd_count(&self) -> usize {
        self.args
            .iter()
            .filter(|arg| matches!(arg.kind, ArgKind::Fd))
            .count()
    }
}

/// A named, versioned interface with independently indexed requests and events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    /// Highest version described by this table
    pub version: u32,
    #[serde(default)]
    pub requests: Vec<MessageSignature>,
    #[serde(default)]
    pub events: Vec<MessageSignature>,
}

impl Interface {
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            requests: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn request(mut self, message: MessageSignature) -> Self {
        self.requests.push(message);
        self
    }

    pub fn event(mut self, message: MessageSignature) -> Self {
        self.events.push(message);
        self
    }
}

// Argument slot constructors for building tables in code

pub fn int(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Int,
    }
}

pub fn uint(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Uint,
    }
}

pub fn fixed(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Fixed,
    }
}

pub fn string(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::String { nullable: false },
    }
}

pub fn nullable_string(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::String { nullable: true },
    }
}

pub fn array(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Array,
    }
}

pub fn object(name: &str, interface: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Object {
            interface: Some(interface.to_string()),
            nullable: false,
        },
    }
}

pub fn nullable_object(name: &str, interface: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Object {
            interface: Some(interface.to_string()),
            nullable: true,
        },
    }
}

pub fn new_id(name: &str, interface: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::NewId(NewIdTarget::Typed {
            interface: interface.to_string(),
            version_arg: None,
        }),
    }
}

pub fn dynamic_new_id(name: &str, interface_arg: usize, version_arg: usize) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::NewId(NewIdTarget::Dynamic {
            interface_arg,
            version_arg,
        }),
    }
}

pub fn fd(name: &str) -> Arg {
    Arg {
        name: name.to_string(),
        kind: ArgKind::Fd,
    }
}
