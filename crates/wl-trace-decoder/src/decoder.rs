// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Stateful message decoder
//!
//! One [`Decoder`] per connection owns the object registry and the globals
//! table. Messages from both directions must be fed to it in the order they
//! were observed so that object creation and destruction line up.

use crate::args::ArgCursor;
use crate::globals::Globals;
use crate::record::{DecodedRecord, MessageKind};
use crate::registry::{ObjectRecord, Registry};
use crate::value::ArgValue;
use crate::warning::{ArgError, DecodeWarning};
use std::sync::Arc;
use tracing::debug;
use wl_trace_proto::{Direction, Message};
use wl_trace_schema::{
    Arg, ArgKind, MessageSignature, NewIdTarget, Schema, DISPLAY_INTERFACE, REGISTRY_INTERFACE,
};

/// Result of decoding one message
#[derive(Debug, Clone)]
pub struct DecodeOutcome {
    pub record: DecodedRecord,
    pub warnings: Vec<DecodeWarning>,
    /// Descriptors the signature says travel with this message
    pub expected_fds: usize,
}

pub struct Decoder {
    schema: Arc<Schema>,
    registry: Registry,
    globals: Globals,
}

/// Borrowed state threaded through argument decoding
struct ArgContext<'a> {
    sender: &'a ObjectRecord,
    signature: &'a MessageSignature,
    seq: u64,
    registry: &'a mut Registry,
    warnings: &'a mut Vec<DecodeWarning>,
}

impl ArgContext<'_> {
    fn malformed(&mut self, arg: &Arg, reason: ArgError) {
        self.warnings.push(DecodeWarning::MalformedArgument {
            interface: self.sender.interface.clone(),
            message: self.signature.name.clone(),
            arg: arg.name.clone(),
            kind: arg.kind.tag(),
            reason,
        });
    }

    fn interface_of(&self, id: u32) -> Option<String> {
        if id == 0 {
            return None;
        }
        self.registry.resolve(id).map(|record| record.interface.clone())
    }

    /// Work out the new object's interface/version and bind it
    fn create(
        &mut self,
        arg: &Arg,
        target: &NewIdTarget,
        id: u32,
        decoded: &[ArgValue],
    ) -> ArgValue {
        let companion = match target {
            NewIdTarget::Typed {
                interface,
                version_arg: None,
            } => Ok((interface.clone(), self.sender.version)),
            NewIdTarget::Typed {
                interface,
                version_arg: Some(index),
            } => uint_at(decoded, *index).map(|version| (interface.clone(), version)),
            NewIdTarget::Dynamic {
                interface_arg,
                version_arg,
            } => text_at(decoded, *interface_arg).and_then(|interface| {
                uint_at(decoded, *version_arg).map(|version| (interface, version))
            }),
        };

        let (interface, version) = match companion {
            Ok(found) => found,
            Err(reason) => {
                self.malformed(arg, reason);
                return ArgValue::NewId {
                    id,
                    interface: None,
                };
            }
        };

        if id != 0 {
            if let Err(warning) = self.registry.bind(id, &interface, version, self.seq) {
                self.warnings.push(warning);
            }
        }
        ArgValue::NewId {
            id,
            interface: Some(interface),
        }
    }
}

fn uint_at(decoded: &[ArgValue], index: usize) -> Result<u32, ArgError> {
    decoded
        .get(index)
        .and_then(ArgValue::as_uint)
        .ok_or(ArgError::BadCompanion {
            index,
            expected: "uint",
        })
}

fn text_at(decoded: &[ArgValue], index: usize) -> Result<String, ArgError> {
    decoded
        .get(index)
        .and_then(ArgValue::as_text)
        .map(str::to_string)
        .ok_or(ArgError::BadCompanion {
            index,
            expected: "string",
        })
}

impl Decoder {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            registry: Registry::new(),
            globals: Globals::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Decode one message and apply its registry side effects
    pub fn decode(&mut self, message: &Message) -> DecodeOutcome {
        let object_id = message.object_id();
        let index = message.opcode();
        let direction = message.direction;
        let mut warnings = Vec::new();

        let opaque = |kind: MessageKind, warnings: Vec<DecodeWarning>| DecodeOutcome {
            record: DecodedRecord {
                seq: message.seq,
                direction,
                object_id,
                kind,
                args: vec![ArgValue::Opaque(message.payload().to_vec())],
            },
            warnings,
            expected_fds: 0,
        };

        let Some(sender) = self.registry.resolve(object_id).cloned() else {
            warnings.push(DecodeWarning::UnknownObject {
                id: object_id,
                opcode: index,
                direction,
            });
            return opaque(MessageKind::UnknownObject { index }, warnings);
        };

        let schema = Arc::clone(&self.schema);
        let Some(signature) = schema.resolve(&sender.interface, sender.version, direction, index)
        else {
            debug!(
                object_id,
                interface = %sender.interface,
                version = sender.version,
                index,
                kind = direction.message_kind(),
                "no signature"
            );
            return opaque(
                MessageKind::UnknownMessage {
                    interface: sender.interface,
                    index,
                },
                warnings,
            );
        };

        let mut args = self.decode_args(&sender, signature, message, &mut warnings);
        self.apply_side_effects(&sender, signature, direction, &mut args);

        DecodeOutcome {
            record: DecodedRecord {
                seq: message.seq,
                direction,
                object_id,
                kind: MessageKind::Resolved {
                    interface: sender.interface.clone(),
                    message: signature.name.clone(),
                },
                args,
            },
            warnings,
            expected_fds: signature.fd_count(),
        }
    }

    fn decode_args(
        &mut self,
        sender: &ObjectRecord,
        signature: &MessageSignature,
        message: &Message,
        warnings: &mut Vec<DecodeWarning>,
    ) -> Vec<ArgValue> {
        let mut ctx = ArgContext {
            sender,
            signature,
            seq: message.seq,
            registry: &mut self.registry,
            warnings,
        };
        let mut cursor = ArgCursor::new(message.payload());
        let mut decoded = Vec::with_capacity(signature.args.len());

        for arg in &signature.args {
            let value = match &arg.kind {
                ArgKind::Int => cursor.read_i32().map(ArgValue::Int),
                ArgKind::Uint => cursor.read_u32().map(ArgValue::Uint),
                ArgKind::Fixed => cursor.read_i32().map(ArgValue::Fixed),
                ArgKind::String { .. } => cursor.read_string().map(ArgValue::Str),
                ArgKind::Array => cursor.read_array().map(ArgValue::Array),
                ArgKind::Object { .. } => cursor.read_u32().map(|id| ArgValue::Object {
                    id,
                    interface: ctx.interface_of(id),
                }),
                ArgKind::NewId(target) => cursor
                    .read_u32()
                    .map(|id| ctx.create(arg, target, id, &decoded)),
                ArgKind::Fd => Ok(ArgValue::Fd),
            };

            match value {
                Ok(value) => decoded.push(value),
                Err(reason) => {
                    ctx.malformed(arg, reason);
                    decoded.push(ArgValue::Malformed);
                }
            }
        }

        if cursor.remaining() > 0 {
            debug!(
                object_id = message.object_id(),
                message = %signature.name,
                trailing = cursor.remaining(),
                "trailing bytes after last argument"
            );
        }
        decoded
    }

    fn apply_side_effects(
        &mut self,
        sender: &ObjectRecord,
        signature: &MessageSignature,
        direction: Direction,
        args: &mut [ArgValue],
    ) {
        if direction == Direction::ServerToClient {
            match (sender.interface.as_str(), signature.name.as_str()) {
                (DISPLAY_INTERFACE, "delete_id") => {
                    if let Some(ArgValue::Uint(id)) = args.first().cloned() {
                        let interface = self
                            .registry
                            .resolve(id)
                            .map(|record| record.interface.clone());
                        args[0] = ArgValue::Object { id, interface };
                        self.registry.release(id);
                    }
                }
                (REGISTRY_INTERFACE, "global") => {
                    if let [ArgValue::Uint(name), interface, ArgValue::Uint(version)] = &*args {
                        if let Some(interface) = interface.as_text() {
                            self.globals.announce(*name, interface, *version);
                        }
                    }
                }
                (REGISTRY_INTERFACE, "global_remove") => {
                    if let Some(ArgValue::Uint(name)) = args.first() {
                        if self.globals.remove(*name).is_none() {
                            debug!(name, "global_remove for an unannounced global");
                        }
                    }
                }
                _ => {}
            }
        }

        if signature.destructor {
            self.registry.release(sender.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DISPLAY_ID;
    use wl_trace_proto::Frame;

    fn message(direction: Direction, seq: u64, object_id: u32, opcode: u16, payload: Vec<u8>) -> Message {
        Message {
            direction,
            seq,
            frame: Frame::new(object_id, opcode, payload).unwrap(),
        }
    }

    fn request(object_id: u32, opcode: u16, payload: Vec<u8>) -> Message {
        message(Direction::ClientToServer, 0, object_id, opcode, payload)
    }

    fn event(object_id: u32, opcode: u16, payload: Vec<u8>) -> Message {
        message(Direction::ServerToClient, 0, object_id, opcode, payload)
    }

    fn decoder() -> Decoder {
        Decoder::new(Arc::new(Schema::builtin()))
    }

    #[test]
    fn test_new_id_inherits_sender_version() {
        let mut decoder = decoder();
        decoder.registry.bind(4, "wl_compositor", 5, 0).unwrap();

        let outcome = decoder.decode(&request(4, 0, 9u32.to_le_bytes().to_vec()));
        assert_eq!(outcome.record.render_line(), "4 wl_compositor.create_surface(new wl_surface@9)");
        let surface = decoder.registry().resolve(9).unwrap();
        assert_eq!(surface.interface, "wl_surface");
        assert_eq!(surface.version, 5);
    }

    #[test]
    fn test_object_argument_uses_registry() {
        let mut decoder = decoder();
        decoder.registry.bind(5, "wl_surface", 6, 0).unwrap();
        decoder.registry.bind(6, "wl_buffer", 1, 0).unwrap();

        let mut payload = 6u32.to_le_bytes().to_vec();
        payload.extend(0i32.to_le_bytes());
        payload.extend((-3i32).to_le_bytes());
        let outcome = decoder.decode(&request(5, 1, payload));
        assert_eq!(
            outcome.record.render_line(),
            "5 wl_surface.attach(wl_buffer@6, 0, -3)"
        );

        let mut payload = 0u32.to_le_bytes().to_vec();
        payload.extend(0i32.to_le_bytes());
        payload.extend(0i32.to_le_bytes());
        let outcome = decoder.decode(&request(5, 1, payload));
        assert_eq!(outcome.record.render_line(), "5 wl_surface.attach(null, 0, 0)");
    }

    #[test]
    fn test_destructor_releases_sender() {
        let mut decoder = decoder();
        decoder.registry.bind(7, "wl_region", 1, 0).unwrap();
        let outcome = decoder.decode(&request(7, 0, Vec::new()));
        assert_eq!(outcome.record.render_line(), "7 wl_region.destroy()");
        assert!(decoder.registry().resolve(7).is_none());
    }

    #[test]
    fn test_delete_id_renders_object_then_releases() {
        let mut decoder = decoder();
        decoder.registry.bind(8, "wl_callback", 1, 0).unwrap();

        let outcome = decoder.decode(&event(DISPLAY_ID, 1, 8u32.to_le_bytes().to_vec()));
        assert_eq!(
            outcome.record.render_line(),
            "1 wl_display.delete_id(wl_callback@8)"
        );
        assert!(decoder.registry().resolve(8).is_none());

        // already gone: rendered as a bare id, no warning
        let outcome = decoder.decode(&event(DISPLAY_ID, 1, 8u32.to_le_bytes().to_vec()));
        assert_eq!(outcome.record.render_line(), "1 wl_display.delete_id(8)");
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_descriptor_args_are_counted() {
        let mut decoder = decoder();
        decoder.registry.bind(10, "wl_keyboard", 9, 0).unwrap();
        let mut payload = 1u32.to_le_bytes().to_vec();
        payload.extend(48_000u32.to_le_bytes());
        let outcome = decoder.decode(&event(10, 0, payload));
        assert_eq!(outcome.record.render_line(), "10 wl_keyboard.keymap(1, fd, 48000)");
        assert_eq!(outcome.expected_fds, 1);
    }

    #[test]
    fn test_malformed_argument_does_not_stop_decoding() {
        let mut decoder = decoder();
        decoder.registry.bind(11, "xdg_toplevel", 6, 0).unwrap();
        // set_title with a string missing its terminator
        let mut payload = 4u32.to_le_bytes().to_vec();
        payload.extend_from_slice(b"abcd");
        let outcome = decoder.decode(&request(11, 2, payload));
        assert_eq!(outcome.record.render_line(), "11 xdg_toplevel.set_title(<malformed>)");
        assert!(matches!(
            outcome.warnings.as_slice(),
            [DecodeWarning::MalformedArgument {
                kind: "string",
                reason: ArgError::MissingTerminator,
                ..
            }]
        ));
        assert!(outcome.warnings[0]
            .to_string()
            .starts_with("xdg_toplevel.set_title string argument 'title'"));
    }

    #[test]
    fn test_unknown_message_on_known_object() {
        let mut decoder = decoder();
        decoder.registry.bind(12, "wl_seat", 1, 0).unwrap();
        // name only exists from version 2
        let outcome = decoder.decode(&event(12, 1, vec![1, 0, 0, 0]));
        assert_eq!(outcome.record.render_line(), "12 wl_seat.1(b'\\x01\\x00\\x00\\x00')");
        assert!(!outcome.record.is_resolved());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_double_bind_is_reported() {
        let mut decoder = decoder();
        decoder.registry.bind(4, "wl_compositor", 6, 0).unwrap();
        decoder.registry.bind(9, "wl_region", 1, 0).unwrap();
        let outcome = decoder.decode(&request(4, 0, 9u32.to_le_bytes().to_vec()));
        assert!(matches!(
            outcome.warnings.as_slice(),
            [DecodeWarning::DoubleBind { id: 9, .. }]
        ));
        assert_eq!(decoder.registry().resolve(9).unwrap().interface, "wl_surface");
    }
}
