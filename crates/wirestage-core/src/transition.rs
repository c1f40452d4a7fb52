//! Camera transition service boundary.
//!
//! The core never interpolates camera values itself. When an action wants a
//! smooth move (zoom in/out, animated center-content) it hands a target pose
//! to a [`CameraTransition`] implementation supplied by the host and samples
//! it from [`crate::stage::Stage::tick`]. Starting a new transition always
//! replaces the in-flight one, so two transitions never fight over the same
//! camera.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A camera endpoint: pan offset plus zoom, as plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

/// Host-supplied animation service for camera moves.
///
/// Contract: `begin` cancels whatever the service was doing and starts a new
/// transition. `sample` is called with the time elapsed since `begin` and
/// returns the pose for that instant, or `None` once the transition has
/// delivered its final pose.
pub trait CameraTransition {
    /// Start (or restart) a transition between two poses.
    fn begin(&mut self, from: CameraPose, to: CameraPose);

    /// Sample the transition. `None` means finished.
    fn sample(&mut self, elapsed: Duration) -> Option<CameraPose>;

    /// Drop any in-flight transition without sampling it again.
    fn cancel(&mut self);
}

/// The default service: jumps straight to the target on the first sample.
///
/// Useful for tests and for hosts that do not animate.
#[derive(Debug, Default)]
pub struct ImmediateTransition {
    target: Option<CameraPose>,
}

impl CameraTransition for ImmediateTransition {
    fn begin(&mut self, _from: CameraPose, to: CameraPose) {
        self.target = Some(to);
    }

    fn sample(&mut self, _elapsed: Duration) -> Option<CameraPose> {
        self.target.take()
    }

    fn cancel(&mut self) {
        self.target = None;
    }
}
