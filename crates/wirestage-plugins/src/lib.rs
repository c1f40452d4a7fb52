//! WireStage Reference Plugins
//!
//! The two plugins every stage host is expected to want: corner-handle
//! resizing and port-to-port connection wires. Both are ordinary
//! [`wirestage_core::StagePlugin`] implementations with no privileged
//! access; they are also the worked example for writing new ones.

pub mod connections;
pub mod resize;

pub use connections::{
    connect, disconnect, disconnect_element, port_position, render_connection_points, s_curve,
    wires, ConnectionWire, ConnectionsPlugin, WireError, WireId, PORT_RADIUS, WIRES_KEY,
};
pub use resize::{ResizePlugin, HANDLE_SIZE};

use wirestage_core::{flatten_plugins, StagePlugin};

/// The default plugin set, in the order gestures take precedence:
/// connections first, then resize.
pub fn default_plugins() -> Vec<Box<dyn StagePlugin>> {
    flatten_plugins(vec![
        vec![Box::new(ConnectionsPlugin::new())],
        vec![Box::new(ResizePlugin::new())],
    ])
}
