// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Stateful Wayland decoder for wl-trace
//!
//! Object ids only acquire meaning from earlier traffic, so decoding is a
//! state machine: the [`Registry`] is updated as a side effect of every
//! message that creates or destroys an object, and each later message is
//! resolved against the interface currently bound to its id.
//!
//! Nothing in this crate can fail a connection. Problems surface as
//! [`DecodeWarning`]s next to a best-effort [`DecodedRecord`].

pub mod args;
pub mod decoder;
pub mod fds;
pub mod filter;
pub mod globals;
pub mod observer;
pub mod record;
pub mod registry;
pub mod value;
pub mod warning;

pub use decoder::{DecodeOutcome, Decoder};
pub use fds::FdLedger;
pub use filter::Filter;
pub use globals::{Global, Globals};
pub use observer::{Observer, Source};
pub use record::{DecodedRecord, MessageKind};
pub use registry::{ObjectRecord, Registry, DISPLAY_ID, SERVER_ID_BASE};
pub use value::{byte_literal, ArgValue};
pub use warning::{ArgError, DecodeWarning};
