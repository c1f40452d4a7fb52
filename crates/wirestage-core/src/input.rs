//! Pointer and keyboard event types fed into the stage.
//!
//! Positions are stage-local screen coordinates: the host subtracts the
//! stage container's own origin from the raw event position before handing
//! the event over (see [`stage_local`]). World-space conversion happens
//! inside the handlers via the camera.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

use crate::hit::HitPath;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Convert a raw host-space pointer position into stage-local screen space.
pub fn stage_local(raw: Point, container_origin: Point) -> Point {
    Point::new(raw.x - container_origin.x, raw.y - container_origin.y)
}

/// A pointer event in stage-local screen coordinates.
///
/// `button` is meaningful for down/up, `movement` for move events.
#[derive(Debug, Clone)]
pub struct PointerEvent {
    /// Position in stage-local screen coordinates.
    pub position: Point,
    pub button: MouseButton,
    pub modifiers: Modifiers,
    /// Screen-space movement since the previous pointer event.
    pub movement: Vec2,
    /// Tag path of the render-tree node under the pointer.
    pub target: HitPath,
}

impl PointerEvent {
    /// A left-button event with no modifiers and a background target.
    pub fn new(position: Point) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            modifiers: Modifiers::default(),
            movement: Vec2::ZERO,
            target: HitPath::empty(),
        }
    }

    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_movement(mut self, movement: Vec2) -> Self {
        self.movement = movement;
        self
    }

    pub fn with_target(mut self, target: HitPath) -> Self {
        self.target = target;
        self
    }
}

/// A wheel/scroll event.
#[derive(Debug, Clone)]
pub struct WheelEvent {
    /// Position in stage-local screen coordinates.
    pub position: Point,
    /// Scroll delta as reported by the host.
    pub delta: Vec2,
    pub modifiers: Modifiers,
}

/// A keyboard event. Keys use the host's logical key strings
/// (" " for space, "=", "-", single characters for letters).
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyboardEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            modifiers: Modifiers::default(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}
