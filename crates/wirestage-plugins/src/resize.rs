//! Corner-handle resizing for selected elements.
//!
//! The plugin paints an outline and four tagged corner handles over every
//! element the stage's client has selected. A pointer-down on a handle
//! claims the event and opens a resize drag; per-move updates recompute the
//! rect from the initial one, floored at the minimum size and optionally
//! aspect-locked with shift.

use kurbo::Rect;

use wirestage_core::drag::resize_rect;
use wirestage_core::hit::{classify, ResizeDir, TagSet, RESIZE_DIR_TAG};
use wirestage_core::input::PointerEvent;
use wirestage_core::scene::{rgb, Primitive, Scene};
use wirestage_core::stage::{accent_color, StageContext};
use wirestage_core::{DragSession, DragTarget, ElementRect, EventOutcome, StagePlugin};

/// Side length of a corner handle, in world units.
pub const HANDLE_SIZE: f64 = 8.0;

/// The resize plugin. Stateless; the gesture lives in the stage's drag
/// session.
#[derive(Debug, Default)]
pub struct ResizePlugin;

impl ResizePlugin {
    pub fn new() -> Self {
        Self
    }
}

fn handle_center(rect: &ElementRect, dir: ResizeDir) -> (f64, f64) {
    let x = if dir.has_left() { rect.x } else { rect.x + rect.width };
    let y = if dir.has_top() { rect.y } else { rect.y + rect.height };
    (x, y)
}

impl StagePlugin for ResizePlugin {
    fn name(&self) -> &str {
        "resize"
    }

    fn on_pointer_down(&mut self, event: &PointerEvent, ctx: &mut StageContext) -> EventOutcome {
        let Some(dir) = event
            .target
            .target_tag(RESIZE_DIR_TAG)
            .and_then(ResizeDir::from_tag)
        else {
            return EventOutcome::Pass;
        };
        let Some(element_id) = classify(&event.target).element_id else {
            return EventOutcome::Pass;
        };
        let Some(initial_rect) = ctx.store.element_rect(element_id) else {
            return EventOutcome::Pass;
        };

        log::debug!("resize start: {element_id} {}", dir.as_tag());
        ctx.drag = Some(DragSession::begin(
            event.position,
            &ctx.camera,
            DragTarget::Resize { element_id, dir, initial_rect },
        ));
        EventOutcome::Claimed
    }

    fn on_window_pointer_move(
        &mut self,
        event: &PointerEvent,
        ctx: &mut StageContext,
    ) -> EventOutcome {
        let Some(session) = &ctx.drag else {
            return EventOutcome::Pass;
        };
        let DragTarget::Resize { element_id, dir, initial_rect } = &session.target else {
            return EventOutcome::Pass;
        };

        let delta = session.world_delta(event.position, &ctx.camera);
        let rect = resize_rect(
            *initial_rect,
            *dir,
            delta,
            ctx.camera.zoom,
            event.modifiers.shift,
        );
        ctx.store.update_element_rect(*element_id, |r| *r = rect);
        EventOutcome::Claimed
    }

    fn view_front(&self, ctx: &StageContext, scene: &mut Scene) {
        for id in ctx.store.selected_elements(ctx.client_id) {
            let Some(rect) = ctx.store.element_rect(id) else {
                continue;
            };

            scene.push(
                Primitive::rect(rect.bounds())
                    .stroked(accent_color(), 1.0)
                    .passive(),
            );
            for dir in ResizeDir::ALL {
                let (cx, cy) = handle_center(&rect, dir);
                let half = HANDLE_SIZE / 2.0;
                scene.push_tagged(
                    Primitive::rect(Rect::new(cx - half, cy - half, cx + half, cy + half))
                        .filled(rgb(255, 255, 255))
                        .stroked(accent_color(), 1.0),
                    TagSet::resize_handle(id, dir),
                );
            }
        }
    }
}
