// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Wayland message signatures for wl-trace
//!
//! The decoder consumes only the lookup contract exposed by [`Schema::resolve`].
//! Tables come from the built-in core/xdg-shell definitions and from optional
//! pre-indexed JSON files; protocol XML parsing is not part of this crate.

pub mod builtin;
pub mod error;
pub mod schema;
pub mod types;

pub use builtin::{DISPLAY_INTERFACE, REGISTRY_INTERFACE};
pub use error::{Result, SchemaError};
pub use schema::{Schema, SchemaTable};
pub use types::{Arg, ArgKind, Interface, MessageSignature, NewIdTarget};
