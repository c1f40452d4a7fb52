//! The drag state machine: one mutually-exclusive gesture per client.
//!
//! A [`DragSession`] lives from pointer-down to pointer-up and holds the
//! anchor plus a tagged target describing the gesture. Initial rects are
//! captured once at drag start; per-move updates always apply the
//! accumulated delta to those, never to the previous frame, so rounding
//! never drifts.

use kurbo::{Point, Vec2};
use std::collections::HashMap;

use crate::camera::Camera;
use crate::element::{ElementId, ElementRect};
use crate::hit::{PortKind, ResizeDir};
use crate::store::SelectionBox;

/// Minimum element size under resize, in screen pixels (divide by zoom for
/// world units).
pub const MIN_RESIZE_SIZE: f64 = 20.0;

/// What a drag is acting on. Exactly one variant is active per client.
///
/// `Resize` and `Connection` are entered by the reference plugins; the core
/// defines them so the session stays a closed sum with no "which optional
/// fields go together" ambiguity.
#[derive(Debug, Clone)]
pub enum DragTarget {
    /// Moving the current selection. Rects are captured at drag start.
    Elements {
        initial_rects: HashMap<ElementId, ElementRect>,
    },
    /// Growing a marquee box from the anchor on empty background.
    Marquee,
    /// Resizing one element by a corner handle.
    Resize {
        element_id: ElementId,
        dir: ResizeDir,
        initial_rect: ElementRect,
    },
    /// Dragging a wire out of a connection point. No store mutation per
    /// move; the preview is derived from the live pointer position.
    Connection {
        element_id: ElementId,
        port: PortKind,
    },
}

/// Ephemeral state spanning one pointer-down-to-pointer-up gesture.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Anchor in stage-local screen coordinates.
    pub anchor_screen: Point,
    /// Anchor in world coordinates, captured at pointer-down.
    pub anchor_world: Point,
    pub target: DragTarget,
}

impl DragSession {
    /// Capture a session at the pointer-down position.
    pub fn begin(screen: Point, camera: &Camera, target: DragTarget) -> Self {
        Self {
            anchor_screen: screen,
            anchor_world: camera.screen_to_world(screen),
            target,
        }
    }

    /// Accumulated world-space delta from the anchor to the current
    /// pointer position.
    pub fn world_delta(&self, current_screen: Point, camera: &Camera) -> Vec2 {
        let current = camera.screen_to_world(current_screen);
        Vec2::new(
            current.x - self.anchor_world.x,
            current.y - self.anchor_world.y,
        )
    }
}

/// Axis-aligned marquee box spanning the anchor and the current pointer,
/// both in world coordinates.
pub fn marquee_box(anchor: Point, current: Point) -> SelectionBox {
    SelectionBox {
        x: anchor.x.min(current.x),
        y: anchor.y.min(current.y),
        width: (current.x - anchor.x).abs(),
        height: (current.y - anchor.y).abs(),
        hidden: false,
    }
}

/// Recompute a rect being resized by a corner handle.
///
/// Width/height derive from the initial rect and the world delta, floored
/// at `MIN_RESIZE_SIZE / zoom` per edge. With `lock_aspect` the dominant
/// axis of the delta drives the other dimension at the initial rect's
/// aspect ratio. Dragging a left/top edge moves the origin so the opposite
/// edge stays pinned.
pub fn resize_rect(
    initial: ElementRect,
    dir: ResizeDir,
    delta: Vec2,
    zoom: f64,
    lock_aspect: bool,
) -> ElementRect {
    let min_size = MIN_RESIZE_SIZE / zoom;
    let mut width = initial.width;
    let mut height = initial.height;

    if dir.has_right() {
        width = (initial.width + delta.x).max(min_size);
    }
    if dir.has_left() {
        width = (initial.width - delta.x).max(min_size);
    }
    if dir.has_bottom() {
        height = (initial.height + delta.y).max(min_size);
    }
    if dir.has_top() {
        height = (initial.height - delta.y).max(min_size);
    }

    if lock_aspect {
        let aspect = initial.width / initial.height;
        if delta.x.abs() > delta.y.abs() {
            height = width / aspect;
        } else {
            width = height * aspect;
        }
    }

    let mut x = initial.x;
    let mut y = initial.y;
    if dir.has_left() {
        x = initial.x + initial.width - width;
    }
    if dir.has_top() {
        y = initial.y + initial.height - height;
    }

    ElementRect { x, y, width, height, z_index: initial.z_index }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_delta_accounts_for_zoom() {
        let mut camera = Camera::new();
        camera.zoom = 2.0;
        let session = DragSession::begin(Point::new(100.0, 100.0), &camera, DragTarget::Marquee);

        let delta = session.world_delta(Point::new(140.0, 120.0), &camera);
        assert!((delta.x - 20.0).abs() < f64::EPSILON);
        assert!((delta.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marquee_box_any_direction() {
        let b = marquee_box(Point::new(100.0, 100.0), Point::new(40.0, 160.0));
        assert!((b.x - 40.0).abs() < f64::EPSILON);
        assert!((b.y - 100.0).abs() < f64::EPSILON);
        assert!((b.width - 60.0).abs() < f64::EPSILON);
        assert!((b.height - 60.0).abs() < f64::EPSILON);
        assert!(!b.hidden);
    }

    #[test]
    fn test_resize_bottom_right_grows() {
        let initial = ElementRect::new(10.0, 10.0, 100.0, 50.0);
        let result = resize_rect(
            initial,
            ResizeDir::BottomRight,
            Vec2::new(30.0, 20.0),
            1.0,
            false,
        );
        assert!((result.x - 10.0).abs() < f64::EPSILON);
        assert!((result.y - 10.0).abs() < f64::EPSILON);
        assert!((result.width - 130.0).abs() < f64::EPSILON);
        assert!((result.height - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_top_left_pins_opposite_corner() {
        let initial = ElementRect::new(10.0, 10.0, 100.0, 50.0);
        let result = resize_rect(
            initial,
            ResizeDir::TopLeft,
            Vec2::new(20.0, 10.0),
            1.0,
            false,
        );
        // Bottom-right corner stays at (110, 60).
        assert!((result.x + result.width - 110.0).abs() < f64::EPSILON);
        assert!((result.y + result.height - 60.0).abs() < f64::EPSILON);
        assert!((result.width - 80.0).abs() < f64::EPSILON);
        assert!((result.height - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resize_floor_scales_with_zoom() {
        let initial = ElementRect::new(0.0, 0.0, 100.0, 100.0);
        for zoom in [0.5, 1.0, 2.0] {
            let result = resize_rect(
                initial,
                ResizeDir::BottomRight,
                Vec2::new(-500.0, -500.0),
                zoom,
                false,
            );
            let floor = MIN_RESIZE_SIZE / zoom;
            assert!((result.width - floor).abs() < f64::EPSILON);
            assert!((result.height - floor).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_resize_aspect_lock() {
        let initial = ElementRect::new(0.0, 0.0, 200.0, 100.0);
        // Horizontal delta dominates: width drives height.
        let result = resize_rect(
            initial,
            ResizeDir::BottomRight,
            Vec2::new(100.0, 10.0),
            1.0,
            true,
        );
        assert!((result.width - 300.0).abs() < f64::EPSILON);
        assert!((result.height - 150.0).abs() < f64::EPSILON);
        let ratio = result.width / result.height;
        assert!((ratio - 2.0).abs() < 1e-9);

        // Vertical delta dominates: height drives width.
        let result = resize_rect(
            initial,
            ResizeDir::BottomRight,
            Vec2::new(10.0, 100.0),
            1.0,
            true,
        );
        let ratio = result.width / result.height;
        assert!((ratio - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_keeps_z_index() {
        let mut initial = ElementRect::new(0.0, 0.0, 100.0, 100.0);
        initial.z_index = 7;
        let result = resize_rect(initial, ResizeDir::TopRight, Vec2::new(5.0, 5.0), 1.0, false);
        assert_eq!(result.z_index, 7);
    }
}
