//! Backend-agnostic display list assembled by the render pass.
//!
//! The core does not rasterize anything. Each frame it builds a [`Frame`]
//! of primitives which the host paints with whatever backend it has. Nodes
//! carry the hit-testing tags of [`crate::hit`], so the same tree the host
//! paints is the tree pointer events are resolved against.

use kurbo::{BezPath, Circle, Point, Rect};
use peniko::Color;

use crate::hit::TagSet;

/// Opaque color from 8-bit channels.
pub fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::from_rgb8(r, g, b)
}

/// One drawable primitive.
#[derive(Debug, Clone)]
pub enum PrimitiveShape {
    Rect(Rect),
    Circle(Circle),
    Path(BezPath),
}

/// A primitive plus paint and interaction metadata.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub shape: PrimitiveShape,
    pub fill: Option<Color>,
    pub stroke: Option<(Color, f64)>,
    /// Whether pointer events can land on this primitive. Decorations
    /// (grid, wires, marquee) are passive, like `pointer-events: none`.
    pub interactive: bool,
}

impl Primitive {
    pub fn rect(rect: Rect) -> Self {
        Self {
            shape: PrimitiveShape::Rect(rect),
            fill: None,
            stroke: None,
            interactive: true,
        }
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        Self {
            shape: PrimitiveShape::Circle(Circle::new(center, radius)),
            fill: None,
            stroke: None,
            interactive: true,
        }
    }

    pub fn path(path: BezPath) -> Self {
        Self {
            shape: PrimitiveShape::Path(path),
            fill: None,
            stroke: None,
            interactive: true,
        }
    }

    pub fn filled(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn stroked(mut self, color: Color, width: f64) -> Self {
        self.stroke = Some((color, width));
        self
    }

    /// Mark the primitive as transparent to pointer events.
    pub fn passive(mut self) -> Self {
        self.interactive = false;
        self
    }

    /// Whether a point (in the primitive's own coordinate space) lands on it.
    /// Paths never hit; they exist for decoration only.
    pub fn hit(&self, point: Point) -> bool {
        if !self.interactive {
            return false;
        }
        match &self.shape {
            PrimitiveShape::Rect(rect) => rect.contains(point),
            PrimitiveShape::Circle(circle) => {
                let dx = point.x - circle.center.x;
                let dy = point.y - circle.center.y;
                dx * dx + dy * dy <= circle.radius * circle.radius
            }
            PrimitiveShape::Path(_) => false,
        }
    }
}

/// One node in the scene: either a leaf primitive or a tagged group.
#[derive(Debug, Clone)]
pub enum SceneNode {
    Primitive {
        primitive: Primitive,
        tags: TagSet,
    },
    Group {
        tags: TagSet,
        children: Scene,
    },
}

/// An ordered list of scene nodes; later nodes paint on top.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Push an untagged primitive.
    pub fn push(&mut self, primitive: Primitive) {
        self.nodes.push(SceneNode::Primitive {
            primitive,
            tags: TagSet::new(),
        });
    }

    /// Push a primitive carrying hit-testing tags.
    pub fn push_tagged(&mut self, primitive: Primitive, tags: TagSet) {
        self.nodes.push(SceneNode::Primitive { primitive, tags });
    }

    /// Open a tagged group and populate it through the closure. Children
    /// inherit the group's tags as ancestors during hit resolution.
    pub fn group(&mut self, tags: TagSet, f: impl FnOnce(&mut Scene)) {
        let mut children = Scene::new();
        f(&mut children);
        self.nodes.push(SceneNode::Group { tags, children });
    }

    /// Move all nodes from `other` onto the end of this scene.
    pub fn append(&mut self, mut other: Scene) {
        self.nodes.append(&mut other.nodes);
    }

    /// Recursively mark every primitive transparent to pointer events.
    /// Used to make elements click-through while a marquee is visible.
    pub fn make_passive(&mut self) {
        for node in &mut self.nodes {
            match node {
                SceneNode::Primitive { primitive, .. } => primitive.interactive = false,
                SceneNode::Group { children, .. } => children.make_passive(),
            }
        }
    }

    /// Total number of primitives, groups included.
    pub fn primitive_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| match n {
                SceneNode::Primitive { .. } => 1,
                SceneNode::Group { children, .. } => children.primitive_count(),
            })
            .sum()
    }
}

/// The output of one render pass.
///
/// `background` is in stage-local screen coordinates; `view` is in world
/// coordinates and the host paints it under the camera transform, mirroring
/// the background-layer/view-layer split of the stage.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub background: Scene,
    pub view: Scene,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_hit() {
        let rect = Primitive::rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(rect.hit(Point::new(5.0, 5.0)));
        assert!(!rect.hit(Point::new(15.0, 5.0)));

        let circle = Primitive::circle(Point::new(0.0, 0.0), 5.0);
        assert!(circle.hit(Point::new(3.0, 0.0)));
        assert!(!circle.hit(Point::new(4.0, 4.0)));
    }

    #[test]
    fn test_passive_primitive_never_hits() {
        let rect = Primitive::rect(Rect::new(0.0, 0.0, 10.0, 10.0)).passive();
        assert!(!rect.hit(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_group_nesting() {
        let mut scene = Scene::new();
        scene.group(TagSet::new(), |g| {
            g.push(Primitive::rect(Rect::new(0.0, 0.0, 1.0, 1.0)));
            g.push(Primitive::circle(Point::ZERO, 1.0));
        });
        scene.push(Primitive::path(BezPath::new()));
        assert_eq!(scene.primitive_count(), 3);
    }
}
