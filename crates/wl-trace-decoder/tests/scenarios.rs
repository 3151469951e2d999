// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Decoding a realistic connection start from raw wire bytes

use pretty_assertions::assert_eq;
use std::sync::Arc;
use wl_trace_decoder::{DecodeWarning, Decoder, Filter, Observer, Source};
use wl_trace_proto::{Direction, Frame, Message, StreamFramer};
use wl_trace_schema::{Interface, MessageSignature, Schema};

/// Little helper to build argument payloads
#[derive(Default)]
struct Payload(Vec<u8>);

impl Payload {
    fn uint(mut self, value: u32) -> Self {
        self.0.extend(value.to_le_bytes());
        self
    }

    fn string(mut self, text: &str) -> Self {
        self.0.extend(((text.len() + 1) as u32).to_le_bytes());
        self.0.extend_from_slice(text.as_bytes());
        self.0.push(0);
        while self.0.len() % 4 != 0 {
            self.0.push(0);
        }
        self
    }

    fn frame(self, object_id: u32, opcode: u16) -> Vec<u8> {
        Frame::new(object_id, opcode, self.0).unwrap().to_bytes()
    }
}

fn decode_stream(decoder: &mut Decoder, framer: &mut StreamFramer, bytes: &[u8]) -> Vec<String> {
    framer
        .feed(bytes)
        .unwrap()
        .iter()
        .map(|message| decoder.decode(message).record.render_line())
        .collect()
}

#[test]
fn registry_listing_does_not_touch_object_ids() {
    let mut decoder = Decoder::new(Arc::new(Schema::builtin()));
    let mut requests = StreamFramer::new(Direction::ClientToServer);
    let mut events = StreamFramer::new(Direction::ServerToClient);

    let lines = decode_stream(
        &mut decoder,
        &mut requests,
        &Payload::default().uint(2).frame(1, 1),
    );
    assert_eq!(lines, vec!["1 wl_display.get_registry(new wl_registry@2)"]);
    let registry = decoder.registry().resolve(2).unwrap();
    assert_eq!(registry.interface, "wl_registry");
    assert_eq!(registry.version, 1);

    let lines = decode_stream(
        &mut decoder,
        &mut events,
        &Payload::default()
            .uint(5)
            .string("wl_shm")
            .uint(1)
            .frame(2, 0),
    );
    assert_eq!(lines, vec!["2 wl_registry.global(5, 'wl_shm', 1)"]);
    assert!(decoder.registry().resolve(5).is_none());
    assert_eq!(decoder.globals().get(5).unwrap().interface, "wl_shm");
}

#[test]
fn bind_creates_object_with_requested_version() {
    let mut decoder = Decoder::new(Arc::new(Schema::builtin()));
    let mut requests = StreamFramer::new(Direction::ClientToServer);
    let mut events = StreamFramer::new(Direction::ServerToClient);

    let mut stream = Payload::default().uint(2).frame(1, 1);
    stream.extend(
        Payload::default()
            .uint(4)
            .string("wl_seat")
            .uint(7)
            .uint(3)
            .frame(2, 0),
    );
    let lines = decode_stream(&mut decoder, &mut requests, &stream);
    assert_eq!(
        lines,
        vec![
            "1 wl_display.get_registry(new wl_registry@2)",
            "2 wl_registry.bind(4, 'wl_seat', 7, new wl_seat@3)",
        ]
    );

    let seat = decoder.registry().resolve(3).unwrap();
    assert_eq!(seat.interface, "wl_seat");
    assert_eq!(seat.version, 7);

    let lines = decode_stream(
        &mut decoder,
        &mut events,
        &Payload::default().string("seat0").frame(3, 1),
    );
    assert_eq!(lines, vec!["3 wl_seat.name('seat0')"]);
}

#[test]
fn unknown_object_falls_back_to_raw_bytes() {
    let mut decoder = Decoder::new(Arc::new(Schema::builtin()));
    let message = Message {
        direction: Direction::ClientToServer,
        seq: 0,
        frame: Frame::new(42, 3, vec![b'h', b'i', 0x00, 0xff]).unwrap(),
    };

    let outcome = decoder.decode(&message);
    assert_eq!(outcome.record.message_kind(), "42.3");
    assert_eq!(outcome.record.render_line(), "42 42.3(b'hi\\x00\\xff')");
    assert_eq!(
        outcome.warnings,
        vec![DecodeWarning::UnknownObject {
            id: 42,
            opcode: 3,
            direction: Direction::ClientToServer,
        }]
    );
}

#[test]
fn destroyed_ids_are_reused_for_new_interfaces() {
    let mut decoder = Decoder::new(Arc::new(Schema::builtin()));
    let mut requests = StreamFramer::new(Direction::ClientToServer);
    let mut events = StreamFramer::new(Direction::ServerToClient);

    let mut stream = Payload::default().uint(2).frame(1, 1);
    stream.extend(
        Payload::default()
            .uint(1)
            .string("wl_compositor")
            .uint(6)
            .uint(3)
            .frame(2, 0),
    );
    // wl_compositor.create_region -> 4, then wl_region.destroy
    stream.extend(Payload::default().uint(4).frame(3, 1));
    stream.extend(Payload::default().frame(4, 0));
    decode_stream(&mut decoder, &mut requests, &stream);
    assert!(decoder.registry().resolve(4).is_none());

    let lines = decode_stream(
        &mut decoder,
        &mut events,
        &Payload::default().uint(4).frame(1, 1),
    );
    assert_eq!(lines, vec!["1 wl_display.delete_id(4)"]);

    // id 4 comes back as a surface
    let lines = decode_stream(
        &mut decoder,
        &mut requests,
        &Payload::default().uint(4).frame(3, 0),
    );
    assert_eq!(lines, vec!["3 wl_compositor.create_surface(new wl_surface@4)"]);
    assert_eq!(decoder.registry().resolve(4).unwrap().interface, "wl_surface");
}

#[test]
fn schema_tables_drive_resolution() {
    let mut schema = Schema::new();
    schema.insert(
        Interface::new("wl_display", 1)
            .request(MessageSignature::new("sync", vec![]))
            .request(MessageSignature::new("ping", vec![])),
    );
    let mut observer = Observer::new(Arc::new(schema), Filter::allow_all());
    let source = Source::new(0, Direction::ClientToServer);

    let mut framer = StreamFramer::new(Direction::ClientToServer);
    let messages = framer
        .feed(&Payload::default().frame(1, 1))
        .unwrap();
    let lines = observer.on_messages(source, &messages, None);
    assert_eq!(lines, vec!["[Client-0] connected", "1 wl_display.ping()"]);
}
