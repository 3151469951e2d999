// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Built-in table for the core protocol and stable xdg-shell

use crate::schema::Schema;
use crate::types::{
    array, dynamic_new_id, fd, fixed, int, new_id, nullable_object, nullable_string, object,
    string, uint, Interface, MessageSignature as M,
};

/// Interface name of the root object
pub const DISPLAY_INTERFACE: &str = "wl_display";

/// Interface whose events announce globals
pub const REGISTRY_INTERFACE: &str = "wl_registry";

impl Schema {
    /// Table covering `wayland.xml` and `xdg-shell.xml`
    pub fn builtin() -> Self {
        let mut schema = Schema::new();
        for interface in core_interfaces().into_iter().chain(xdg_shell_interfaces()) {
            schema.insert(interface);
        }
        schema
    }
}

fn core_interfaces() -> Vec<Interface> {
    vec![
        Interface::new(DISPLAY_INTERFACE, 1)
            .request(M::new("sync", vec![new_id("callback", "wl_callback")]))
            .request(M::new("get_registry", vec![new_id("registry", "wl_registry")]))
            .event(M::new(
                "error",
                vec![
                    object("object_id", "wl_object"),
                    uint("code"),
                    string("message"),
                ],
            ))
            .event(M::new("delete_id", vec![uint("id")])),
        Interface::new(REGISTRY_INTERFACE, 1)
            .request(M::new(
                "bind",
                vec![
                    uint("name"),
                    string("interface"),
                    uint("version"),
                    dynamic_new_id("id", 1, 2),
                ],
            ))
            .event(M::new(
                "global",
                vec![uint("name"), string("interface"), uint("version")],
            ))
            .event(M::new("global_remove", vec![uint("name")])),
        Interface::new("wl_callback", 1)
            .event(M::new("done", vec![uint("callback_data")]).destructor()),
        Interface::new("wl_compositor", 6)
            .request(M::new("create_surface", vec![new_id("id", "wl_surface")]))
            .request(M::new("create_region", vec![new_id("id", "wl_region")])),
        Interface::new("wl_shm_pool", 2)
            .request(M::new(
                "create_buffer",
                vec![
                    new_id("id", "wl_buffer"),
                    int("offset"),
                    int("width"),
                    int("height"),
                    int("stride"),
                    uint("format"),
                ],
            ))
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new("resize", vec![int("size")])),
        Interface::new("wl_shm", 2)
            .request(M::new(
                "create_pool",
                vec![new_id("id", "wl_shm_pool"), fd("fd"), int("size")],
            ))
            .request(M::new("release", vec![]).since(2).destructor())
            .event(M::new("format", vec![uint("format")])),
        Interface::new("wl_buffer", 1)
            .request(M::new("destroy", vec![]).destructor())
            .event(M::new("release", vec![])),
        Interface::new("wl_data_offer", 3)
            .request(M::new(
                "accept",
                vec![uint("serial"), nullable_string("mime_type")],
            ))
            .request(M::new("receive", vec![string("mime_type"), fd("fd")]))
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new("finish", vec![]).since(3))
            .request(
                M::new(
                    "set_actions",
                    vec![uint("dnd_actions"), uint("preferred_action")],
                )
                .since(3),
            )
            .event(M::new("offer", vec![string("mime_type")]))
            .event(M::new("source_actions", vec![uint("source_actions")]).since(3))
            .event(M::new("action", vec![uint("dnd_action")]).since(3)),
        Interface::new("wl_data_source", 3)
            .request(M::new("offer", vec![string("mime_type")]))
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new("set_actions", vec![uint("dnd_actions")]).since(3))
            .event(M::new("target", vec![nullable_string("mime_type")]))
            .event(M::new("send", vec![string("mime_type"), fd("fd")]))
            .event(M::new("cancelled", vec![]))
            .event(M::new("dnd_drop_performed", vec![]).since(3))
            .event(M::new("dnd_finished", vec![]).since(3))
            .event(M::new("action", vec![uint("dnd_action")]).since(3)),
        Interface::new("wl_data_device", 3)
            .request(M::new(
                "start_drag",
                vec![
                    nullable_object("source", "wl_data_source"),
                    object("origin", "wl_surface"),
                    nullable_object("icon", "wl_surface"),
                    uint("serial"),
                ],
            ))
            .request(M::new(
                "set_selection",
                vec![nullable_object("source", "wl_data_source"), uint("serial")],
            ))
            .request(M::new("release", vec![]).since(2).destructor())
            .event(M::new("data_offer", vec![new_id("id", "wl_data_offer")]))
            .event(M::new(
                "enter",
                vec![
                    uint("serial"),
                    object("surface", "wl_surface"),
                    fixed("x"),
                    fixed("y"),
                    nullable_object("id", "wl_data_offer"),
                ],
            ))
            .event(M::new("leave", vec![]))
            .event(M::new("motion", vec![uint("time"), fixed("x"), fixed("y")]))
            .event(M::new("drop", vec![]))
            .event(M::new(
                "selection",
                vec![nullable_object("id", "wl_data_offer")],
            )),
        Interface::new("wl_data_device_manager", 3)
            .request(M::new(
                "create_data_source",
                vec![new_id("id", "wl_data_source")],
            ))
            .request(M::new(
                "get_data_device",
                vec![new_id("id", "wl_data_device"), object("seat", "wl_seat")],
            )),
        Interface::new("wl_surface", 6)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new(
                "attach",
                vec![nullable_object("buffer", "wl_buffer"), int("x"), int("y")],
            ))
            .request(M::new(
                "damage",
                vec![int("x"), int("y"), int("width"), int("height")],
            ))
            .request(M::new("frame", vec![new_id("callback", "wl_callback")]))
            .request(M::new(
                "set_opaque_region",
                vec![nullable_object("region", "wl_region")],
            ))
            .request(M::new(
                "set_input_region",
                vec![nullable_object("region", "wl_region")],
            ))
            .request(M::new("commit", vec![]))
            .request(M::new("set_buffer_transform", vec![int("transform")]).since(2))
            .request(M::new("set_buffer_scale", vec![int("scale")]).since(3))
            .request(
                M::new(
                    "damage_buffer",
                    vec![int("x"), int("y"), int("width"), int("height")],
                )
                .since(4),
            )
            .request(M::new("offset", vec![int("x"), int("y")]).since(5))
            .event(M::new("enter", vec![object("output", "wl_output")]))
            .event(M::new("leave", vec![object("output", "wl_output")]))
            .event(M::new("preferred_buffer_scale", vec![int("factor")]).since(6))
            .event(M::new("preferred_buffer_transform", vec![uint("transform")]).since(6)),
        Interface::new("wl_seat", 9)
            .request(M::new("get_pointer", vec![new_id("id", "wl_pointer")]))
            .request(M::new("get_keyboard", vec![new_id("id", "wl_keyboard")]))
            .request(M::new("get_touch", vec![new_id("id", "wl_touch")]))
            .request(M::new("release", vec![]).since(5).destructor())
            .event(M::new("capabilities", vec![uint("capabilities")]))
            .event(M::new("name", vec![string("name")]).since(2)),
        Interface::new("wl_pointer", 9)
            .request(M::new(
                "set_cursor",
                vec![
                    uint("serial"),
                    nullable_object("surface", "wl_surface"),
                    int("hotspot_x"),
                    int("hotspot_y"),
                ],
            ))
            .request(M::new("release", vec![]).since(3).destructor())
            .event(M::new(
                "enter",
                vec![
                    uint("serial"),
                    object("surface", "wl_surface"),
                    fixed("surface_x"),
                    fixed("surface_y"),
                ],
            ))
            .event(M::new(
                "leave",
                vec![uint("serial"), object("surface", "wl_surface")],
            ))
            .event(M::new(
                "motion",
                vec![uint("time"), fixed("surface_x"), fixed("surface_y")],
            ))
            .event(M::new(
                "button",
                vec![uint("serial"), uint("time"), uint("button"), uint("state")],
            ))
            .event(M::new(
                "axis",
                vec![uint("time"), uint("axis"), fixed("value")],
            ))
            .event(M::new("frame", vec![]).since(5))
            .event(M::new("axis_source", vec![uint("axis_source")]).since(5))
            .event(M::new("axis_stop", vec![uint("time"), uint("axis")]).since(5))
            .event(M::new("axis_discrete", vec![uint("axis"), int("discrete")]).since(5))
            .event(M::new("axis_value120", vec![uint("axis"), int("value120")]).since(8))
            .event(
                M::new(
                    "axis_relative_direction",
                    vec![uint("axis"), uint("direction")],
                )
                .since(9),
            ),
        Interface::new("wl_keyboard", 9)
            .request(M::new("release", vec![]).since(3).destructor())
            .event(M::new(
                "keymap",
                vec![uint("format"), fd("fd"), uint("size")],
            ))
            .event(M::new(
                "enter",
                vec![
                    uint("serial"),
                    object("surface", "wl_surface"),
                    array("keys"),
                ],
            ))
            .event(M::new(
                "leave",
                vec![uint("serial"), object("surface", "wl_surface")],
            ))
            .event(M::new(
                "key",
                vec![uint("serial"), uint("time"), uint("key"), uint("state")],
            ))
            .event(M::new(
                "modifiers",
                vec![
                    uint("serial"),
                    uint("mods_depressed"),
                    uint("mods_latched"),
                    uint("mods_locked"),
                    uint("group"),
                ],
            ))
            .event(M::new("repeat_info", vec![int("rate"), int("delay")]).since(4)),
        Interface::new("wl_touch", 9)
            .request(M::new("release", vec![]).since(3).destructor())
            .event(M::new(
                "down",
                vec![
                    uint("serial"),
                    uint("time"),
                    object("surface", "wl_surface"),
                    int("id"),
                    fixed("x"),
                    fixed("y"),
                ],
            ))
            .event(M::new("up", vec![uint("serial"), uint("time"), int("id")]))
            .event(M::new(
                "motion",
                vec![uint("time"), int("id"), fixed("x"), fixed("y")],
            ))
            .event(M::new("frame", vec![]))
            .event(M::new("cancel", vec![]))
            .event(
                M::new("shape", vec![int("id"), fixed("major"), fixed("minor")]).since(6),
            )
            .event(M::new("orientation", vec![int("id"), fixed("orientation")]).since(6)),
        Interface::new("wl_output", 4)
            .request(M::new("release", vec![]).since(3).destructor())
            .event(M::new(
                "geometry",
                vec![
                    int("x"),
                    int("y"),
                    int("physical_width"),
                    int("physical_height"),
                    int("subpixel"),
                    string("make"),
                    string("model"),
                    int("transform"),
                ],
            ))
            .event(M::new(
                "mode",
                vec![uint("flags"), int("width"), int("height"), int("refresh")],
            ))
            .event(M::new("done", vec![]).since(2))
            .event(M::new("scale", vec![int("factor")]).since(2))
            .event(M::new("name", vec![string("name")]).since(4))
            .event(M::new("description", vec![string("description")]).since(4)),
        Interface::new("wl_region", 1)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new(
                "add",
                vec![int("x"), int("y"), int("width"), int("height")],
            ))
            .request(M::new(
                "subtract",
                vec![int("x"), int("y"), int("width"), int("height")],
            )),
        Interface::new("wl_subcompositor", 1)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new(
                "get_subsurface",
                vec![
                    new_id("id", "wl_subsurface"),
                    object("surface", "wl_surface"),
                    object("parent", "wl_surface"),
                ],
            )),
        Interface::new("wl_subsurface", 1)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new("set_position", vec![int("x"), int("y")]))
            .request(M::new("place_above", vec![object("sibling", "wl_surface")]))
            .request(M::new("place_below", vec![object("sibling", "wl_surface")]))
            .request(M::new("set_sync", vec![]))
            .request(M::new("set_desync", vec![])),
    ]
}

fn xdg_shell_interfaces() -> Vec<Interface> {
    vec![
        Interface::new("xdg_wm_base", 6)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new(
                "create_positioner",
                vec![new_id("id", "xdg_positioner")],
            ))
            .request(M::new(
                "get_xdg_surface",
                vec![new_id("id", "xdg_surface"), object("surface", "wl_surface")],
            ))
            .request(M::new("pong", vec![uint("serial")]))
            .event(M::new("ping", vec![uint("serial")])),
        Interface::new("xdg_positioner", 6)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new("set_size", vec![int("width"), int("height")]))
            .request(M::new(
                "set_anchor_rect",
                vec![int("x"), int("y"), int("width"), int("height")],
            ))
            .request(M::new("set_anchor", vec![uint("anchor")]))
            .request(M::new("set_gravity", vec![uint("gravity")]))
            .request(M::new(
                "set_constraint_adjustment",
                vec![uint("constraint_adjustment")],
            ))
            .request(M::new("set_offset", vec![int("x"), int("y")]))
            .request(M::new("set_reactive", vec![]).since(3))
            .request(
                M::new(
                    "set_parent_size",
                    vec![int("parent_width"), int("parent_height")],
                )
                .since(3),
            )
            .request(M::new("set_parent_configure", vec![uint("serial")]).since(3)),
        Interface::new("xdg_surface", 6)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new("get_toplevel", vec![new_id("id", "xdg_toplevel")]))
            .request(M::new(
                "get_popup",
                vec![
                    new_id("id", "xdg_popup"),
                    nullable_object("parent", "xdg_surface"),
                    object("positioner", "xdg_positioner"),
                ],
            ))
            .request(M::new(
                "set_window_geometry",
                vec![int("x"), int("y"), int("width"), int("height")],
            ))
            .request(M::new("ack_configure", vec![uint("serial")]))
            .event(M::new("configure", vec![uint("serial")])),
        Interface::new("xdg_toplevel", 6)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new(
                "set_parent",
                vec![nullable_object("parent", "xdg_toplevel")],
            ))
            .request(M::new("set_title", vec![string("title")]))
            .request(M::new("set_app_id", vec![string("app_id")]))
            .request(M::new(
                "show_window_menu",
                vec![
                    object("seat", "wl_seat"),
                    uint("serial"),
                    int("x"),
                    int("y"),
                ],
            ))
            .request(M::new(
                "move",
                vec![object("seat", "wl_seat"), uint("serial")],
            ))
            .request(M::new(
                "resize",
                vec![object("seat", "wl_seat"), uint("serial"), uint("edges")],
            ))
            .request(M::new("set_max_size", vec![int("width"), int("height")]))
            .request(M::new("set_min_size", vec![int("width"), int("height")]))
            .request(M::new("set_maximized", vec![]))
            .request(M::new("unset_maximized", vec![]))
            .request(M::new(
                "set_fullscreen",
                vec![nullable_object("output", "wl_output")],
            ))
            .request(M::new("unset_fullscreen", vec![]))
            .request(M::new("set_minimized", vec![]))
            .event(M::new(
                "configure",
                vec![int("width"), int("height"), array("states")],
            ))
            .event(M::new("close", vec![]))
            .event(
                M::new("configure_bounds", vec![int("width"), int("height")]).since(4),
            )
            .event(M::new("wm_capabilities", vec![array("capabilities")]).since(5)),
        Interface::new("xdg_popup", 6)
            .request(M::new("destroy", vec![]).destructor())
            .request(M::new(
                "grab",
                vec![object("seat", "wl_seat"), uint("serial")],
            ))
            .request(
                M::new(
                    "reposition",
                    vec![object("positioner", "xdg_positioner"), uint("token")],
                )
                .since(3),
            )
            .event(M::new(
                "configure",
                vec![int("x"), int("y"), int("width"), int("height")],
            ))
            .event(M::new("popup_done", vec![]))
            .event(M::new("repositioned", vec![uint("token")]).since(3)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::validate_interface;
    use crate::types::{ArgKind, NewIdTarget};
    use wl_trace_proto::Direction;

    #[test]
    fn test_builtin_tables_validate() {
        let schema = Schema::builtin();
        assert_eq!(schema.len(), 25);
        for interface in schema.to_table().interfaces {
            validate_interface(&interface).unwrap();
        }
    }

    #[test]
    fn test_registry_bind_is_dynamic() {
        let schema = Schema::builtin();
        let bind = schema
            .resolve(REGISTRY_INTERFACE, 1, Direction::ClientToServer, 0)
            .unwrap();
        assert_eq!(bind.name, "bind");
        assert_eq!(
            bind.args[3].kind,
            ArgKind::NewId(NewIdTarget::Dynamic {
                interface_arg: 1,
                version_arg: 2
            })
        );
    }

    #[test]
    fn test_destructors_and_descriptors() {
        let schema = Schema::builtin();
        let done = schema
            .resolve("wl_callback", 1, Direction::ServerToClient, 0)
            .unwrap();
        assert!(done.destructor);

        let keymap = schema
            .resolve("wl_keyboard", 1, Direction::ServerToClient, 0)
            .unwrap();
        assert_eq!(keymap.fd_count(), 1);

        let release = schema.resolve("wl_shm", 1, Direction::ClientToServer, 1);
        assert!(release.is_none(), "wl_shm.release needs version 2");
    }
}
