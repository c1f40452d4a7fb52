//! Element data model: typed placement plus an untyped payload.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique element identifier, assigned at creation and never reused.
pub type ElementId = Uuid;

/// Untyped, entity-specific payload. Opaque to the core; renderers and the
/// host are responsible for interpreting it.
pub type ElementProps = serde_json::Map<String, serde_json::Value>;

/// Placement of an element on the canvas, in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Stacking order. The most recently raised element holds the strict
    /// maximum across the store.
    pub z_index: u32,
}

impl ElementRect {
    /// Create a rect at the bottom of the stacking order.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height, z_index: 1 }
    }

    /// Bounding box as a kurbo rect.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Check whether a world point falls inside the rect.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Open-interval overlap test against an axis-aligned box.
    ///
    /// Rects that merely touch along an edge do not overlap. This is the
    /// test marquee selection uses.
    pub fn overlaps(&self, x: f64, y: f64, width: f64, height: f64) -> bool {
        self.x < x + width
            && self.x + self.width > x
            && self.y < y + height
            && self.y + self.height > y
    }
}

/// A positioned, sized visual entity on the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Host-defined type string, matched against the renderer registry.
    #[serde(rename = "type")]
    pub element_type: String,
    /// Placement in world coordinates.
    pub rect: ElementRect,
    /// Entity-specific payload, opaque to the core.
    #[serde(default)]
    pub props: ElementProps,
}

/// An element as supplied to `create_element`: everything but identity and
/// stacking order, which the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub props: ElementProps,
}

impl NewElement {
    /// Convenience constructor with empty props.
    pub fn new(element_type: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            element_type: element_type.into(),
            x,
            y,
            width,
            height,
            props: ElementProps::new(),
        }
    }

    /// Attach a single prop value.
    pub fn with_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub(crate) fn into_element(self) -> Element {
        Element {
            element_type: self.element_type,
            rect: ElementRect::new(self.x, self.y, self.width, self.height),
            props: self.props,
        }
    }
}
