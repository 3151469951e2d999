// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Descriptor bookkeeping
//!
//! Handles arrive out-of-band, so the only check possible is cumulative:
//! per direction, the handles received must cover the handles declared by the
//! messages decoded so far.

use crate::warning::DecodeWarning;
use wl_trace_proto::Direction;

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    received: u64,
    expected: u64,
    reported_deficit: u64,
}

#[derive(Debug, Default)]
pub struct FdLedger {
    tallies: [Tally; 2],
}

impl FdLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&mut self, direction: Direction, count: usize) {
        self.tallies[direction.index()].received += count as u64;
    }

    pub fn expected(&mut self, direction: Direction, count: usize) {
        self.tallies[direction.index()].expected += count as u64;
    }

    /// Report a deficit once each time it grows
    pub fn check(&mut self, direction: Direction) -> Option<DecodeWarning> {
        let tally = &mut self.tallies[direction.index()];
        let deficit = tally.expected.saturating_sub(tally.received);
        if deficit <= tally.reported_deficit {
            tally.reported_deficit = deficit;
            return None;
        }
        tally.reported_deficit = deficit;
        Some(DecodeWarning::FdMismatch {
            direction,
            expected: tally.expected,
            received: tally.received,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_ledger_is_quiet() {
        let mut ledger = FdLedger::new();
        ledger.received(Direction::ServerToClient, 1);
        ledger.expected(Direction::ServerToClient, 1);
        assert!(ledger.check(Direction::ServerToClient).is_none());
    }

    #[test]
    fn test_deficit_reported_once() {
        let mut ledger = FdLedger::new();
        ledger.expected(Direction::ClientToServer, 2);
        ledger.received(Direction::ClientToServer, 1);
        assert_eq!(
            ledger.check(Direction::ClientToServer),
            Some(DecodeWarning::FdMismatch {
                direction: Direction::ClientToServer,
                expected: 2,
                received: 1,
            })
        );
        assert!(ledger.check(Direction::ClientToServer).is_none());

        // directions are independent
        assert!(ledger.check(Direction::ServerToClient).is_none());
    }
}
