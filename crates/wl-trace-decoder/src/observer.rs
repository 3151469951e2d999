// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Observation stream
//!
//! Turns framed traffic from any number of sessions into output lines:
//!
//! ```text
//! [Client-0] connected
//! 1 wl_display.get_registry(new wl_registry@2)
//! [Server-0] connected
//! 2 wl_registry.global(1, 'wl_compositor', 6)
//! [Client-0]
//! 2 wl_registry.bind(1, 'wl_compositor', 6, new wl_compositor@3)
//! [Server-0] disconnected
//! ```
//!
//! A side is announced as connected with its first traffic. A bare source
//! label separates lines whose source differs from the previous emitted line.
//! Each session gets its own [`Decoder`], so registries are never shared
//! between connections.

use crate::decoder::Decoder;
use crate::fds::FdLedger;
use crate::filter::Filter;
use crate::warning::DecodeWarning;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use wl_trace_proto::{Direction, Message};
use wl_trace_schema::Schema;

/// One side of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Source {
    pub session: u64,
    pub direction: Direction,
}

impl Source {
    pub fn new(session: u64, direction: Direction) -> Self {
        Self { session, direction }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}-{}]", self.direction.origin(), self.session)
    }
}

struct SessionTrace {
    decoder: Decoder,
    fds: FdLedger,
    open: [bool; 2],
}

pub struct Observer {
    schema: Arc<Schema>,
    filter: Filter,
    sessions: HashMap<u64, SessionTrace>,
    last_source: Option<Source>,
}

impl Observer {
    pub fn new(schema: Arc<Schema>, filter: Filter) -> Self {
        Self {
            schema,
            filter,
            sessions: HashMap::new(),
            last_source: None,
        }
    }

    /// Sessions with at least one side still open
    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Decoder state of a live session
    pub fn decoder(&self, session: u64) -> Option<&Decoder> {
        self.sessions.get(&session).map(|trace| &trace.decoder)
    }

    /// Decode a batch of messages read from one side
    ///
    /// `fds_received` is the number of descriptors that arrived with the batch,
    /// or `None` when unknown (replay), which disables the descriptor check.
    pub fn on_messages(
        &mut self,
        source: Source,
        messages: &[Message],
        fds_received: Option<usize>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        let schema = &self.schema;
        let trace = self
            .sessions
            .entry(source.session)
            .or_insert_with(|| SessionTrace {
                decoder: Decoder::new(Arc::clone(schema)),
                fds: FdLedger::new(),
                open: [false; 2],
            });

        let side = source.direction.index();
        if !trace.open[side] {
            trace.open[side] = true;
            lines.push(format!("{source} connected"));
            self.last_source = Some(source);
        }

        if let Some(count) = fds_received {
            trace.fds.received(source.direction, count);
        }

        for message in messages {
            let outcome = trace.decoder.decode(message);
            for warning in &outcome.warnings {
                report(source, warning);
            }
            if fds_received.is_some() {
                trace.fds.expected(source.direction, outcome.expected_fds);
            }

            let line = outcome.record.render_line();
            if !self.filter.allows(&line) {
                continue;
            }
            if self.last_source != Some(source) {
                lines.push(source.to_string());
                self.last_source = Some(source);
            }
            lines.push(line);
        }

        if fds_received.is_some() {
            if let Some(warning) = trace.fds.check(source.direction) {
                report(source, &warning);
            }
        }
        lines
    }

    /// One side of a session went away
    pub fn on_closed(&mut self, source: Source) -> Vec<String> {
        self.last_source = None;
        if let Some(trace) = self.sessions.get_mut(&source.session) {
            trace.open[source.direction.index()] = false;
            if trace.open == [false; 2] {
                debug!(session = source.session, "dropping session decoder");
                self.sessions.remove(&source.session);
            }
        }
        vec![format!("{source} disconnected")]
    }
}

fn report(source: Source, warning: &DecodeWarning) {
    match warning {
        DecodeWarning::UnknownObject { .. } => {
            debug!(session = source.session, direction = %source.direction, "{warning}")
        }
        _ => warn!(session = source.session, direction = %source.direction, "{warning}"),
    }
}
