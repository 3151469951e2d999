// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::io::Write;
use wl_trace_proto::Direction;
use wl_trace_schema::{ArgKind, NewIdTarget, Schema, SchemaError};

const VIEWPORTER: &str = r#"{
  "interfaces": [
    {
      "name": "wp_viewporter",
      "version": 1,
      "requests": [
        { "name": "destroy", "destructor": true },
        {
          "name": "get_viewport",
          "args": [
            { "name": "id", "kind": { "new_id": { "typed": { "interface": "wp_viewport" } } } },
            { "name": "surface", "kind": { "object": { "interface": "wl_surface" } } }
          ]
        }
      ]
    },
    {
      "name": "wp_viewport",
      "version": 1,
      "requests": [
        { "name": "destroy", "destructor": true },
        {
          "name": "set_source",
          "args": [
            { "name": "x", "kind": "fixed" },
            { "name": "y", "kind": "fixed" },
            { "name": "width", "kind": "fixed" },
            { "name": "height", "kind": "fixed" }
          ]
        }
      ]
    }
  ]
}"#;

#[test]
fn json_table_loads_from_file_and_merges_into_builtin() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(VIEWPORTER.as_bytes()).unwrap();

    let extra = Schema::from_json_file(file.path()).unwrap();
    assert_eq!(extra.len(), 2);

    let mut schema = Schema::builtin();
    let before = schema.len();
    schema.merge(extra);
    assert_eq!(schema.len(), before + 2);

    let get_viewport = schema
        .resolve("wp_viewporter", 1, Direction::ClientToServer, 1)
        .unwrap();
    assert_eq!(get_viewport.name, "get_viewport");
    assert_eq!(
        get_viewport.args[0].kind,
        ArgKind::NewId(NewIdTarget::Typed {
            interface: "wp_viewport".to_string(),
            version_arg: None,
        })
    );

    let destroy = schema
        .resolve("wp_viewport", 1, Direction::ClientToServer, 0)
        .unwrap();
    assert!(destroy.destructor);

    // core interfaces are still there
    assert!(schema
        .resolve("wl_surface", 6, Direction::ClientToServer, 6)
        .is_some());
}

#[test]
fn exported_table_reloads_identically() {
    let builtin = Schema::builtin();
    let json = serde_json::to_string(&builtin.to_table()).unwrap();
    let reloaded = Schema::from_json_str(&json).unwrap();

    assert_eq!(reloaded.len(), builtin.len());
    assert_eq!(
        reloaded.interface("wl_registry"),
        builtin.interface("wl_registry")
    );
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = Schema::from_json_file(&path).unwrap_err();
    match err {
        SchemaError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn broken_companion_reference_is_rejected() {
    let json = r#"{
      "interfaces": [{
        "name": "ext_broken",
        "version": 1,
        "requests": [{
          "name": "create",
          "args": [
            { "name": "id", "kind": { "new_id": { "dynamic": { "interface_arg": 3, "version_arg": 4 } } } }
          ]
        }]
      }]
    }"#;
    let err = Schema::from_json_str(json).unwrap_err();
    assert!(matches!(err, SchemaError::InvalidSignature { .. }));
}
