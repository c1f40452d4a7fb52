//! Imperative actions exposed on the stage context.
//!
//! These are the entry points hosts and plugins call outside the event
//! handlers: spawning elements and driving the camera programmatically.
//! Camera actions go through the transition service, so a host that wires
//! in a tweening implementation gets smooth moves for free.

use crate::camera::{Camera, ZOOM_STEP};
use crate::element::{ElementId, NewElement};
use crate::stage::StageContext;

/// Options for [`StageContext::center_content`].
#[derive(Debug, Clone, Copy)]
pub struct CenterContentOptions {
    /// Animate the move through the transition service instead of jumping.
    pub animate: bool,
    /// Screen-pixel margin kept around the content on each side.
    pub margin: f64,
}

impl Default for CenterContentOptions {
    fn default() -> Self {
        Self { animate: false, margin: 50.0 }
    }
}

impl StageContext {
    /// Create an element in the shared store. Convenience passthrough so
    /// plugins holding a context don't need a separate store handle.
    pub fn create_element(&self, spec: NewElement) -> ElementId {
        self.store.create_element(spec)
    }

    /// Pan and zoom so the bounding box of all elements is centered in the
    /// viewport with the requested margin.
    ///
    /// The fitted zoom is intentionally unclamped; fitting is an explicit
    /// request and may exceed the interactive zoom range. Does nothing when
    /// the store is empty or the content has no area.
    pub fn center_content(&mut self, options: CenterContentOptions) {
        let Some(bounds) = self.store.content_bounds() else {
            log::debug!("center_content: no elements");
            return;
        };
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            log::debug!("center_content: content has no area");
            return;
        }

        let pose = Camera::fit_pose(bounds, self.container_size, options.margin);
        if options.animate {
            self.animate_camera_to(pose);
        } else {
            self.camera.set_pose(pose);
        }
    }

    /// Zoom in one step, anchored at the viewport center.
    pub fn zoom_in(&mut self) {
        self.zoom_step(ZOOM_STEP);
    }

    /// Zoom out one step, anchored at the viewport center.
    pub fn zoom_out(&mut self) {
        self.zoom_step(1.0 / ZOOM_STEP);
    }

    fn zoom_step(&mut self, factor: f64) {
        let center = self.container_center();
        let target = self.camera.zoomed_pose(center, factor);
        // Always routed through the transition so rapid steps retarget the
        // in-flight move instead of stacking.
        self.animate_camera_to(target);
    }
}

/// Convenience for seeding demo content: a couple of nodes laid out apart.
pub fn demo_elements() -> Vec<NewElement> {
    vec![
        NewElement::new("node", 50.0, 50.0, 100.0, 100.0),
        NewElement::new("node", 400.0, 200.0, 100.0, 100.0),
    ]
}
