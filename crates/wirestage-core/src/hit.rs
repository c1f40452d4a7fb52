//! Hit-testing: explicit tags instead of type inspection.
//!
//! Every interactive region in the render tree carries string tags. The
//! core only understands two of them, the element boundary and the view
//! region; everything else is a plugin-defined control kind that the core
//! passes through untouched. Tag keys and the control direction values are
//! the wire format between the core, plugins and renderers and must be kept
//! stable.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::element::ElementId;
use crate::scene::{Scene, SceneNode};

/// Tag naming the owning element's id. Present on element containers and on
/// plugin controls that belong to an element.
pub const ELEMENT_ID_TAG: &str = "data-element-id";
/// Tag marking the background/view region of the stage.
pub const STAGE_VIEW_TAG: &str = "data-stage-view";
/// Tag carried by resize handles; its value is a [`ResizeDir`].
pub const RESIZE_DIR_TAG: &str = "data-resize-dir";
/// Tag carried by connection points; its value is a [`PortKind`].
pub const CONNECTION_POINT_TAG: &str = "data-connection-point";

/// Which corner a resize handle controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResizeDir {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeDir {
    /// The four corners, in rendering order.
    pub const ALL: [ResizeDir; 4] = [
        ResizeDir::TopLeft,
        ResizeDir::TopRight,
        ResizeDir::BottomLeft,
        ResizeDir::BottomRight,
    ];

    /// Stable tag value ("top left", "bottom right", ...).
    pub fn as_tag(&self) -> &'static str {
        match self {
            ResizeDir::TopLeft => "top left",
            ResizeDir::TopRight => "top right",
            ResizeDir::BottomLeft => "bottom left",
            ResizeDir::BottomRight => "bottom right",
        }
    }

    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "top left" => Some(ResizeDir::TopLeft),
            "top right" => Some(ResizeDir::TopRight),
            "bottom left" => Some(ResizeDir::BottomLeft),
            "bottom right" => Some(ResizeDir::BottomRight),
            _ => None,
        }
    }

    pub fn has_left(&self) -> bool {
        matches!(self, ResizeDir::TopLeft | ResizeDir::BottomLeft)
    }

    pub fn has_right(&self) -> bool {
        matches!(self, ResizeDir::TopRight | ResizeDir::BottomRight)
    }

    pub fn has_top(&self) -> bool {
        matches!(self, ResizeDir::TopLeft | ResizeDir::TopRight)
    }

    pub fn has_bottom(&self) -> bool {
        matches!(self, ResizeDir::BottomLeft | ResizeDir::BottomRight)
    }
}

/// Direction of a connection point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortKind {
    Input,
    Output,
}

impl PortKind {
    /// Stable tag value ("input" / "output").
    pub fn as_tag(&self) -> &'static str {
        match self {
            PortKind::Input => "input",
            PortKind::Output => "output",
        }
    }

    pub fn from_tag(value: &str) -> Option<Self> {
        match value {
            "input" => Some(PortKind::Input),
            "output" => Some(PortKind::Output),
            _ => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            PortKind::Input => PortKind::Output,
            PortKind::Output => PortKind::Input,
        }
    }
}

/// The tags carried by one render-tree node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeMap<String, String>);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Tags for an element container.
    pub fn element(id: ElementId) -> Self {
        Self::new().with(ELEMENT_ID_TAG, id.to_string())
    }

    /// Tags for the background/view region.
    pub fn view() -> Self {
        Self::new().with(STAGE_VIEW_TAG, "true")
    }

    /// Tags for a resize handle owned by an element.
    pub fn resize_handle(id: ElementId, dir: ResizeDir) -> Self {
        Self::element(id).with(RESIZE_DIR_TAG, dir.as_tag())
    }

    /// Tags for a connection point owned by an element.
    pub fn connection_point(id: ElementId, port: PortKind) -> Self {
        Self::element(id).with(CONNECTION_POINT_TAG, port.as_tag())
    }
}

/// The tag sets along the path from the exact event target outward to the
/// stage root. Index 0 is the target itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitPath(Vec<TagSet>);

impl HitPath {
    /// A miss: the pointer landed on nothing interactive (background).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_target_outward(tags: Vec<TagSet>) -> Self {
        Self(tags)
    }

    /// Tags of the exact event target, if any.
    pub fn target(&self) -> Option<&TagSet> {
        self.0.first()
    }

    /// Look a tag up on the exact target only.
    pub fn target_tag(&self, key: &str) -> Option<&str> {
        self.target().and_then(|t| t.get(key))
    }

    /// Walk outward for the nearest ancestor (target included) carrying the
    /// given tag.
    pub fn closest_tag(&self, key: &str) -> Option<&str> {
        self.0.iter().find_map(|t| t.get(key))
    }
}

/// Coarse classification of a pointer target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Nearest ancestor element id, if the pointer landed inside an element
    /// or one of its controls.
    pub element_id: Option<ElementId>,
    /// Whether the exact target carries a plugin-defined control tag. The
    /// core skips its default pointer-down handling for such targets and
    /// leaves the event for plugins to claim.
    pub plugin_control: bool,
}

impl Hit {
    /// Background: neither element nor control.
    pub fn is_background(&self) -> bool {
        self.element_id.is_none() && !self.plugin_control
    }
}

/// Resolve a hit path into the two facts the core cares about.
pub fn classify(path: &HitPath) -> Hit {
    let element_id = path
        .closest_tag(ELEMENT_ID_TAG)
        .and_then(|v| v.parse().ok());
    let plugin_control = path.target().is_some_and(|tags| {
        tags.keys()
            .any(|k| k != ELEMENT_ID_TAG && k != STAGE_VIEW_TAG)
    });
    Hit { element_id, plugin_control }
}

/// Resolve the topmost interactive primitive under a point, returning the
/// tag path from that primitive outward through its ancestor groups.
///
/// Later siblings paint on top, so the last hit in paint order wins. An
/// empty path means the pointer landed on the background.
pub fn pick(scene: &Scene, point: Point) -> HitPath {
    let mut best: Option<Vec<TagSet>> = None;
    let mut ancestors: Vec<TagSet> = Vec::new();
    pick_into(scene, point, &mut ancestors, &mut best);
    match best {
        Some(path) => HitPath::from_target_outward(path),
        None => HitPath::empty(),
    }
}

fn pick_into(
    scene: &Scene,
    point: Point,
    ancestors: &mut Vec<TagSet>,
    best: &mut Option<Vec<TagSet>>,
) {
    for node in scene.nodes() {
        match node {
            SceneNode::Primitive { primitive, tags } => {
                if primitive.hit(point) {
                    let mut path = vec![tags.clone()];
                    path.extend(ancestors.iter().rev().cloned());
                    *best = Some(path);
                }
            }
            SceneNode::Group { tags, children } => {
                ancestors.push(tags.clone());
                pick_into(children, point, ancestors, best);
                ancestors.pop();
            }
        }
    }
}
