//! Port-to-port connection wires between elements.
//!
//! Wires live in the store's extension namespace under [`WIRES_KEY`], so
//! every stage over the store sees the same set and observers get a change
//! notification whenever it moves. A wire is always normalized to flow
//! output to input; connecting the same pair from either end is the same
//! wire.

use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use wirestage_core::hit::{classify, PortKind, TagSet, CONNECTION_POINT_TAG};
use wirestage_core::input::PointerEvent;
use wirestage_core::scene::{rgb, Primitive, Scene};
use wirestage_core::stage::{accent_color, StageContext};
use wirestage_core::store::StageStore;
use wirestage_core::{
    DragSession, DragTarget, ElementId, ElementRect, EventOutcome, StagePlugin,
};

/// Extension-namespace key the wire set is stored under.
pub const WIRES_KEY: &str = "connection-wires";

/// Radius of a connection point circle, in world units.
pub const PORT_RADIUS: f64 = 6.5;

/// Stroke width of permanent wires and the drag preview.
const WIRE_WIDTH: f64 = 2.0;

/// Unique wire identifier.
pub type WireId = Uuid;

/// One directed wire, normalized so `from_element` is the output side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionWire {
    pub id: WireId,
    pub from_element: ElementId,
    pub to_element: ElementId,
}

type WireMap = HashMap<WireId, ConnectionWire>;

/// Why a connection attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("cannot connect an element to itself")]
    SelfLoop,
    #[error("cannot connect two ports of the same kind")]
    SamePort,
    #[error("one of the endpoints does not exist")]
    MissingElement,
    #[error("these elements are already connected")]
    Duplicate,
}

/// Connect two ports, in either grab order.
///
/// The wire is normalized output to input before the duplicate check, so
/// `connect(a, Output, b, Input)` and `connect(b, Input, a, Output)` name
/// the same wire.
pub fn connect(
    store: &StageStore,
    from: ElementId,
    from_port: PortKind,
    to: ElementId,
    to_port: PortKind,
) -> Result<WireId, WireError> {
    if from == to {
        return Err(WireError::SelfLoop);
    }
    if from_port == to_port {
        return Err(WireError::SamePort);
    }
    // Stale drop targets and elements removed mid-gesture must not leave a
    // dangling wire behind.
    if store.element(from).is_none() || store.element(to).is_none() {
        return Err(WireError::MissingElement);
    }

    let (output_el, input_el) = match from_port {
        PortKind::Output => (from, to),
        PortKind::Input => (to, from),
    };

    let duplicate = store
        .extension::<WireMap, _>(WIRES_KEY, |wires| {
            wires
                .values()
                .any(|w| w.from_element == output_el && w.to_element == input_el)
        })
        .unwrap_or(false);
    if duplicate {
        return Err(WireError::Duplicate);
    }

    let id = Uuid::new_v4();
    store.extension_mut::<WireMap, _>(WIRES_KEY, |wires| {
        wires.insert(
            id,
            ConnectionWire { id, from_element: output_el, to_element: input_el },
        );
    });
    log::debug!("connected {output_el} -> {input_el}");
    Ok(id)
}

/// Remove a wire. Unknown ids are a no-op.
pub fn disconnect(store: &StageStore, id: WireId) -> bool {
    store.extension_mut::<WireMap, _>(WIRES_KEY, |wires| wires.remove(&id).is_some())
}

/// Snapshot of all wires, in stable id order.
pub fn wires(store: &StageStore) -> Vec<ConnectionWire> {
    let mut all = store
        .extension::<WireMap, _>(WIRES_KEY, |wires| wires.values().copied().collect::<Vec<_>>())
        .unwrap_or_default();
    all.sort_by_key(|w| w.id);
    all
}

/// Remove every wire touching an element. Hosts call this when deleting an
/// element so no dangling wires survive.
pub fn disconnect_element(store: &StageStore, id: ElementId) -> usize {
    store.extension_mut::<WireMap, _>(WIRES_KEY, |wires| {
        let before = wires.len();
        wires.retain(|_, w| w.from_element != id && w.to_element != id);
        before - wires.len()
    })
}

/// Where a port sits on an element: inputs at the left-edge center,
/// outputs at the right-edge center.
pub fn port_position(rect: &ElementRect, port: PortKind) -> Point {
    let y = rect.y + rect.height / 2.0;
    match port {
        PortKind::Input => Point::new(rect.x, y),
        PortKind::Output => Point::new(rect.x + rect.width, y),
    }
}

/// The S-shaped cubic between two ports.
///
/// Control handles extend along the dominant axis of the span, reaching at
/// least 50 world units and growing with distance so long wires keep their
/// curve.
pub fn s_curve(from: Point, to: Point) -> BezPath {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let offset = (dx.hypot(dy) * 0.4).max(50.0);

    let (c1, c2) = if dx.abs() >= dy.abs() {
        (
            Point::new(from.x + offset, from.y),
            Point::new(to.x - offset, to.y),
        )
    } else {
        (
            Point::new(from.x, from.y + offset),
            Point::new(to.x, to.y - offset),
        )
    };

    let mut path = BezPath::new();
    path.move_to(from);
    path.curve_to(c1, c2, to);
    path
}

/// Paint both connection points of an element. Host renderers call this
/// from their element renderer so the ports share the element's group and
/// inherit its id tag.
pub fn render_connection_points(id: ElementId, rect: &ElementRect, scene: &mut Scene) {
    for port in [PortKind::Input, PortKind::Output] {
        scene.push_tagged(
            Primitive::circle(port_position(rect, port), PORT_RADIUS)
                .filled(rgb(255, 255, 255))
                .stroked(rgb(100, 116, 139), 1.0),
            TagSet::connection_point(id, port),
        );
    }
}

/// The connections plugin: drag from one port, drop on a compatible one.
#[derive(Debug, Default)]
pub struct ConnectionsPlugin;

impl ConnectionsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl StagePlugin for ConnectionsPlugin {
    fn name(&self) -> &str {
        "connections"
    }

    fn on_pointer_down(&mut self, event: &PointerEvent, ctx: &mut StageContext) -> EventOutcome {
        let Some(port) = event
            .target
            .target_tag(CONNECTION_POINT_TAG)
            .and_then(PortKind::from_tag)
        else {
            return EventOutcome::Pass;
        };
        let Some(element_id) = classify(&event.target).element_id else {
            return EventOutcome::Pass;
        };
        if ctx.store.element(element_id).is_none() {
            return EventOutcome::Pass;
        }

        log::debug!("wire drag start: {element_id} {}", port.as_tag());
        ctx.drag = Some(DragSession::begin(
            event.position,
            &ctx.camera,
            DragTarget::Connection { element_id, port },
        ));
        EventOutcome::Claimed
    }

    fn on_window_pointer_move(
        &mut self,
        _event: &PointerEvent,
        ctx: &mut StageContext,
    ) -> EventOutcome {
        // The preview is derived from the cursor at render time; the move
        // only needs claiming so later plugins stay out of the gesture.
        match ctx.drag.as_ref().map(|s| &s.target) {
            Some(DragTarget::Connection { .. }) => EventOutcome::Claimed,
            _ => EventOutcome::Pass,
        }
    }

    fn on_window_pointer_up(&mut self, event: &PointerEvent, ctx: &mut StageContext) -> EventOutcome {
        let Some(DragTarget::Connection { element_id, port }) =
            ctx.drag.as_ref().map(|s| s.target.clone())
        else {
            return EventOutcome::Pass;
        };

        let drop_port = event
            .target
            .target_tag(CONNECTION_POINT_TAG)
            .and_then(PortKind::from_tag);
        let drop_element = classify(&event.target).element_id;
        if let (Some(drop_port), Some(drop_element)) = (drop_port, drop_element) {
            if let Err(err) = connect(&ctx.store, element_id, port, drop_element, drop_port) {
                log::warn!("wire rejected: {err}");
            }
        }
        EventOutcome::Claimed
    }

    fn view_back(&self, ctx: &StageContext, scene: &mut Scene) {
        let gray = rgb(100, 116, 139);
        for wire in wires(&ctx.store) {
            // Skip wires whose endpoint was removed; the host prunes them.
            let (Some(from_rect), Some(to_rect)) = (
                ctx.store.element_rect(wire.from_element),
                ctx.store.element_rect(wire.to_element),
            ) else {
                continue;
            };
            let from = port_position(&from_rect, PortKind::Output);
            let to = port_position(&to_rect, PortKind::Input);
            scene.push(Primitive::path(s_curve(from, to)).stroked(gray, WIRE_WIDTH).passive());
        }

        if let Some(session) = &ctx.drag {
            if let DragTarget::Connection { element_id, port } = &session.target {
                if let Some(rect) = ctx.store.element_rect(*element_id) {
                    let origin = port_position(&rect, *port);
                    let cursor = ctx.world_pointer();
                    // Draw outputs forward and inputs backward so the curve
                    // always leaves the port in its natural direction.
                    let path = match port {
                        PortKind::Output => s_curve(origin, cursor),
                        PortKind::Input => s_curve(cursor, origin),
                    };
                    scene.push(Primitive::path(path).stroked(accent_color(), WIRE_WIDTH).passive());
                }
            }
        }
    }
}
