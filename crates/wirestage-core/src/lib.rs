//! WireStage Core Library
//!
//! Platform-agnostic interaction core for the WireStage canvas: camera,
//! shared stage store, hit-testing, the drag state machine and the plugin
//! dispatcher. Rendering and real input devices live in the host.

pub mod actions;
pub mod camera;
pub mod drag;
pub mod element;
pub mod hit;
pub mod input;
pub mod plugin;
pub mod scene;
pub mod stage;
pub mod store;
pub mod transition;

pub use actions::CenterContentOptions;
pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM, ZOOM_STEP};
pub use drag::{marquee_box, resize_rect, DragSession, DragTarget, MIN_RESIZE_SIZE};
pub use element::{Element, ElementId, ElementProps, ElementRect, NewElement};
pub use hit::{classify, pick, Hit, HitPath, PortKind, ResizeDir, TagSet};
pub use input::{KeyboardEvent, Modifiers, MouseButton, PointerEvent, WheelEvent};
pub use plugin::{flatten_plugins, EventOutcome, StagePlugin};
pub use scene::{Frame, Primitive, PrimitiveShape, Scene, SceneNode};
pub use stage::{ElementRenderer, Stage, StageContext, GRID_SIZE};
pub use store::{Change, ClientId, SelectionBox, StageStore, SubscriptionId, WeakStageStore};
pub use transition::{CameraPose, CameraTransition, ImmediateTransition};
