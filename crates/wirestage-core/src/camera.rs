//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::transition::CameraPose;

/// Default minimum zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Default maximum zoom level.
pub const MAX_ZOOM: f64 = 10.0;
/// Multiplier applied by a single zoom-in/zoom-out step.
pub const ZOOM_STEP: f64 = 1.2;

/// Camera manages the view transform for the stage.
///
/// It handles panning (translation) and zooming (scaling), converting
/// between stage-local screen coordinates and world coordinates:
/// `screen = world * zoom + offset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    /// Current translation offset (pan), in screen units.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts world coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.offset.x) / self.zoom,
            (screen_point.y - self.offset.y) / self.zoom,
        )
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        Point::new(
            world_point.x * self.zoom + self.offset.x,
            world_point.y * self.zoom + self.offset.y,
        )
    }

    /// Pan the camera by a delta in screen coordinates.
    ///
    /// Panning is independent of zoom: it shifts the offset directly.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Clamp a zoom value into the configured range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Zoom the camera by a factor, keeping the given screen point fixed.
    ///
    /// The world point under `focal` stays at `focal` after the zoom.
    pub fn zoom_at(&mut self, focal: Point, factor: f64) {
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_focal = self.screen_to_world(focal);
        self.zoom = new_zoom;
        self.offset = Vec2::new(
            focal.x - world_focal.x * new_zoom,
            focal.y - world_focal.y * new_zoom,
        );
    }

    /// Compute the pose that zooms by `factor`, anchored at a screen point,
    /// without mutating the camera. Used as an animation target.
    pub fn zoomed_pose(&self, focal: Point, factor: f64) -> CameraPose {
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        let scale = new_zoom / self.zoom;
        CameraPose {
            x: focal.x - (focal.x - self.offset.x) * scale,
            y: focal.y - (focal.y - self.offset.y) * scale,
            zoom: new_zoom,
        }
    }

    /// Compute the pose that fits `bounds` into `viewport` with `margin`
    /// pixels on each side, centering the bounds.
    ///
    /// The resulting zoom is deliberately not clamped: fit-to-content is an
    /// explicit request and may land outside the interactive zoom range.
    pub fn fit_pose(bounds: Rect, viewport: Size, margin: f64) -> CameraPose {
        let zoom_x = (viewport.width - margin * 2.0) / bounds.width();
        let zoom_y = (viewport.height - margin * 2.0) / bounds.height();
        let zoom = zoom_x.min(zoom_y);

        let center = bounds.center();
        CameraPose {
            x: viewport.width / 2.0 - center.x * zoom,
            y: viewport.height / 2.0 - center.y * zoom,
            zoom,
        }
    }

    /// Current pose, for use as a transition endpoint.
    pub fn pose(&self) -> CameraPose {
        CameraPose {
            x: self.offset.x,
            y: self.offset.y,
            zoom: self.zoom,
        }
    }

    /// Apply a pose produced by a transition or fit computation.
    pub fn set_pose(&mut self, pose: CameraPose) {
        self.offset = Vec2::new(pose.x, pose.y);
        self.zoom = pose.zoom;
    }
}
