// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Capture files built in memory and decoded the way `wl-trace replay` does

use pretty_assertions::assert_eq;
use std::sync::Arc;
use wl_trace_cli::replay::{replay_stream, ReplaySummary};
use wl_trace_decoder::{Filter, Observer};
use wl_trace_proto::{CaptureWriter, Direction, Frame};
use wl_trace_schema::Schema;

const C2S: Direction = Direction::ClientToServer;
const S2C: Direction = Direction::ServerToClient;

fn frame(object_id: u32, opcode: u16, words: &[&[u8]]) -> Vec<u8> {
    Frame::new(object_id, opcode, words.concat())
        .unwrap()
        .to_bytes()
}

fn wire_string(text: &str) -> Vec<u8> {
    let mut out = ((text.len() + 1) as u32).to_le_bytes().to_vec();
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    while out.len() % 4 != 0 {
        out.push(0);
    }
    out
}

fn decode(capture: Vec<u8>, filter: Filter) -> (Vec<String>, ReplaySummary) {
    let mut observer = Observer::new(Arc::new(Schema::builtin()), filter);
    let mut out = Vec::new();
    let summary = replay_stream(capture.as_slice(), &mut observer, &mut out).unwrap();
    assert_eq!(observer.active_sessions(), 0);
    let text = String::from_utf8(out).unwrap();
    (text.lines().map(str::to_string).collect(), summary)
}

/// Two interleaved sessions; the first request arrives in two reads
fn two_sessions() -> Vec<u8> {
    let mut writer = CaptureWriter::new(Vec::new()).unwrap();

    let get_registry = frame(1, 1, &[&2u32.to_le_bytes()]);
    writer.write_data(0, C2S, &get_registry[..6]).unwrap();
    writer.write_data(0, C2S, &get_registry[6..]).unwrap();

    let global = frame(
        2,
        0,
        &[&1u32.to_le_bytes(), &wire_string("wl_compositor"), &4u32.to_le_bytes()],
    );
    writer.write_data(0, S2C, &global).unwrap();

    writer
        .write_data(1, C2S, &frame(1, 0, &[&2u32.to_le_bytes()]))
        .unwrap();

    let bind = frame(
        2,
        0,
        &[
            &1u32.to_le_bytes(),
            &wire_string("wl_compositor"),
            &4u32.to_le_bytes(),
            &3u32.to_le_bytes(),
        ],
    );
    writer.write_data(0, C2S, &bind).unwrap();

    writer.write_closed(1, C2S).unwrap();
    writer.write_closed(1, S2C).unwrap();
    writer.write_closed(0, C2S).unwrap();
    writer.write_closed(0, S2C).unwrap();
    writer.into_inner()
}

#[test]
fn test_replay_interleaved_sessions() {
    let (lines, summary) = decode(two_sessions(), Filter::allow_all());

    assert_eq!(
        lines,
        vec![
            "[Client-0] connected",
            "1 wl_display.get_registry(new wl_registry@2)",
            "[Server-0] connected",
            "2 wl_registry.global(1, 'wl_compositor', 4)",
            "[Client-1] connected",
            "1 wl_display.sync(new wl_callback@2)",
            "[Client-0]",
            "2 wl_registry.bind(1, 'wl_compositor', 4, new wl_compositor@3)",
            "[Client-1] disconnected",
            "[Server-1] disconnected",
            "[Client-0] disconnected",
            "[Server-0] disconnected",
        ]
    );
    assert_eq!(summary.records, 9);
    assert_eq!(summary.lines, 12);
}

#[test]
fn test_replay_applies_filter() {
    let filter = Filter::new(None, Some("global|sync")).unwrap();
    let (lines, _) = decode(two_sessions(), filter);

    assert_eq!(
        lines,
        vec![
            "[Client-0] connected",
            "1 wl_display.get_registry(new wl_registry@2)",
            "[Server-0] connected",
            "[Client-1] connected",
            "[Client-0]",
            "2 wl_registry.bind(1, 'wl_compositor', 4, new wl_compositor@3)",
            "[Client-1] disconnected",
            "[Server-1] disconnected",
            "[Client-0] disconnected",
            "[Server-0] disconnected",
        ]
    );
}

#[test]
fn test_replay_stops_decoding_a_malformed_leg() {
    let mut writer = CaptureWriter::new(Vec::new()).unwrap();
    // declared length 4 is shorter than the header
    writer.write_data(0, C2S, &[1, 0, 0, 0, 0, 0, 4, 0]).unwrap();
    writer
        .write_data(0, C2S, &frame(1, 0, &[&2u32.to_le_bytes()]))
        .unwrap();
    writer
        .write_data(0, S2C, &frame(1, 1, &[&9u32.to_le_bytes()]))
        .unwrap();
    writer.write_closed(0, C2S).unwrap();
    writer.write_closed(0, S2C).unwrap();

    let (lines, _) = decode(writer.into_inner(), Filter::allow_all());
    assert_eq!(
        lines,
        vec![
            "[Client-0] connected",
            "[Server-0] connected",
            "1 wl_display.delete_id(9)",
            "[Client-0] disconnected",
            "[Server-0] disconnected",
        ]
    );
}

#[test]
fn test_replay_rejects_foreign_input() {
    let mut observer = Observer::new(Arc::new(Schema::builtin()), Filter::allow_all());
    let mut out = Vec::new();
    let err = replay_stream(&b"not a capture file"[..], &mut observer, &mut out).unwrap_err();
    assert!(format!("{err:#}").contains("not a wl-trace capture"));
    assert!(out.is_empty());
}
