//! The stage: one interactive viewport over a shared store.
//!
//! A [`Stage`] owns a camera, a client id, the drag state machine and an
//! ordered plugin list. The host feeds it pointer/keyboard/wheel events in
//! stage-local screen coordinates and asks it for a [`Frame`] whenever
//! something changed. For every event the core's own handling runs first,
//! then each plugin in registration order until one claims the event.

use kurbo::{BezPath, Point, Rect, Size, Vec2};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use crate::camera::Camera;
use crate::drag::{marquee_box, DragSession, DragTarget};
use crate::element::{Element, ElementId};
use crate::hit::{classify, pick, HitPath, TagSet};
use crate::input::{KeyboardEvent, MouseButton, PointerEvent, WheelEvent};
use crate::plugin::StagePlugin;
use crate::scene::{rgb, Frame, Primitive, Scene};
use crate::store::{ClientId, StageStore};
use crate::transition::{CameraPose, CameraTransition, ImmediateTransition};

/// World-space grid spacing of the default background.
pub const GRID_SIZE: f64 = 40.0;

/// Zoom factor per wheel unit when zooming with the command modifier held.
const WHEEL_ZOOM_SENSITIVITY: f64 = 0.01;

/// Shared accent color for selection chrome (marquee, handles, previews).
pub fn accent_color() -> peniko::Color {
    rgb(14, 165, 233)
}

fn marquee_fill() -> peniko::Color {
    peniko::Color::from_rgba8(14, 165, 233, 26)
}

/// Paints one element into its tagged group.
///
/// Renderers receive the element snapshot, whether this stage's client has
/// it selected, and the context for store/camera reads.
pub type ElementRenderer = Box<dyn Fn(ElementId, &Element, bool, &StageContext, &mut Scene)>;

type BackgroundRenderer = Box<dyn Fn(&StageContext, &mut Scene)>;

/// Everything a stage's event handlers, actions and plugins operate on.
///
/// Split out of [`Stage`] so plugin hooks can borrow it mutably while the
/// plugin list itself is being iterated.
pub struct StageContext {
    pub store: StageStore,
    pub camera: Camera,
    /// This stage's identity in the store's client-scoped maps.
    pub client_id: ClientId,
    /// Size of the stage's viewport, in screen pixels. Zero until the host
    /// calls [`Stage::set_container_size`].
    pub container_size: Size,
    /// Latest pointer position, in stage-local screen coordinates.
    pub pointer_position: Point,
    /// Whether camera panning is armed (space held or middle button down).
    pub panning: bool,
    /// Whether a pointer button is currently held on the stage.
    pub pointer_down: bool,
    /// The in-flight drag gesture, if any. At most one per stage.
    pub drag: Option<DragSession>,
    transition: Box<dyn CameraTransition>,
    transition_elapsed: Option<Duration>,
}

impl std::fmt::Debug for StageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageContext")
            .field("client_id", &self.client_id)
            .field("camera", &self.camera)
            .field("panning", &self.panning)
            .field("drag", &self.drag)
            .finish()
    }
}

impl StageContext {
    fn new(store: StageStore) -> Self {
        Self {
            store,
            camera: Camera::new(),
            client_id: Uuid::new_v4(),
            container_size: Size::ZERO,
            pointer_position: Point::ZERO,
            panning: false,
            pointer_down: false,
            drag: None,
            transition: Box::new(ImmediateTransition::default()),
            transition_elapsed: None,
        }
    }

    /// The pointer position in world coordinates.
    pub fn world_pointer(&self) -> Point {
        self.camera.screen_to_world(self.pointer_position)
    }

    /// Center of the viewport, in stage-local screen coordinates.
    pub fn container_center(&self) -> Point {
        Point::new(self.container_size.width / 2.0, self.container_size.height / 2.0)
    }

    /// Start a camera transition toward `target`, replacing any in-flight
    /// one. With the default [`ImmediateTransition`] the next
    /// [`Stage::tick`] lands on the target directly.
    pub fn animate_camera_to(&mut self, target: CameraPose) {
        if self.transition_elapsed.is_some() {
            self.transition.cancel();
        }
        self.transition.begin(self.camera.pose(), target);
        self.transition_elapsed = Some(Duration::ZERO);
    }

    fn advance_transition(&mut self, dt: Duration) {
        let Some(elapsed) = self.transition_elapsed.as_mut() else {
            return;
        };
        *elapsed += dt;
        let elapsed = *elapsed;
        match self.transition.sample(elapsed) {
            Some(pose) => self.camera.set_pose(pose),
            None => self.transition_elapsed = None,
        }
    }

    /// Replace the selection with `id` and promote it, unless the element
    /// is already part of the selection (so group drags keep their set).
    fn begin_element_drag(&mut self, id: ElementId, position: Point) {
        let client = self.client_id;
        self.store.batch(|store| {
            if !store.is_selected(client, id) {
                store.set_selection(client, vec![id]);
                store.bring_to_front(id);
            }
        });

        let mut initial_rects = HashMap::new();
        for selected in self.store.selected_elements(client) {
            if let Some(rect) = self.store.element_rect(selected) {
                initial_rects.insert(selected, rect);
            }
        }
        log::debug!("drag start: {} element(s)", initial_rects.len());
        self.drag = Some(DragSession::begin(
            position,
            &self.camera,
            DragTarget::Elements { initial_rects },
        ));
    }

    fn begin_marquee(&mut self, position: Point) {
        self.store.set_selection(self.client_id, Vec::new());
        self.drag = Some(DragSession::begin(position, &self.camera, DragTarget::Marquee));
    }

    /// Apply a marquee box: select every overlapped element and flag the
    /// box hidden, as one batch.
    fn finalize_marquee(&mut self) {
        let Some(sbox) = self.store.selection_box(self.client_id) else {
            return;
        };
        if sbox.hidden {
            return;
        }
        let selected = self
            .store
            .elements_overlapping(sbox.x, sbox.y, sbox.width, sbox.height);
        let client = self.client_id;
        self.store.batch(|store| {
            store.set_selection(client, selected);
            store.hide_selection_box(client);
        });
    }
}

/// One interactive viewport over a [`StageStore`].
pub struct Stage {
    ctx: StageContext,
    plugins: Vec<Box<dyn StagePlugin>>,
    renderers: HashMap<String, ElementRenderer>,
    background: BackgroundRenderer,
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("ctx", &self.ctx)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("renderers", &self.renderers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Stage {
    /// Create a stage over a store, with a fresh client id, the identity
    /// camera and no plugins.
    pub fn new(store: StageStore) -> Self {
        Self {
            ctx: StageContext::new(store),
            plugins: Vec::new(),
            renderers: HashMap::new(),
            background: Box::new(default_background),
        }
    }

    /// Swap in a host-supplied camera transition service.
    pub fn with_transition(mut self, transition: Box<dyn CameraTransition>) -> Self {
        self.ctx.transition = transition;
        self
    }

    /// Append a plugin. Dispatch order is registration order.
    pub fn add_plugin(&mut self, plugin: impl StagePlugin + 'static) {
        log::debug!("registered plugin {}", plugin.name());
        self.plugins.push(Box::new(plugin));
    }

    /// Append a pre-built plugin list, preserving its order.
    pub fn add_plugins(&mut self, plugins: Vec<Box<dyn StagePlugin>>) {
        for plugin in &plugins {
            log::debug!("registered plugin {}", plugin.name());
        }
        self.plugins.extend(plugins);
    }

    /// Register the renderer for one element type. Elements whose type has
    /// no renderer keep their tagged group but paint nothing.
    pub fn register_renderer(
        &mut self,
        element_type: impl Into<String>,
        renderer: impl Fn(ElementId, &Element, bool, &StageContext, &mut Scene) + 'static,
    ) {
        self.renderers.insert(element_type.into(), Box::new(renderer));
    }

    /// Replace the default grid background.
    pub fn set_background(&mut self, background: impl Fn(&StageContext, &mut Scene) + 'static) {
        self.background = Box::new(background);
    }

    /// Tell the stage how big its viewport is. Actions that anchor on the
    /// viewport center (zoom steps, center-content) depend on this.
    pub fn set_container_size(&mut self, width: f64, height: f64) {
        self.ctx.container_size = Size::new(width, height);
    }

    pub fn context(&self) -> &StageContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut StageContext {
        &mut self.ctx
    }

    pub fn store(&self) -> &StageStore {
        &self.ctx.store
    }

    pub fn camera(&self) -> &Camera {
        &self.ctx.camera
    }

    pub fn client_id(&self) -> ClientId {
        self.ctx.client_id
    }

    // --- event handlers ---

    /// Pointer button pressed inside the stage container.
    pub fn on_pointer_down(&mut self, event: &PointerEvent) {
        let ctx = &mut self.ctx;
        ctx.pointer_position = event.position;
        ctx.pointer_down = true;

        if event.button == MouseButton::Middle {
            ctx.panning = true;
        }

        // A plugin control under the pointer suppresses the core's default
        // handling; the event is left for the owning plugin to claim.
        let hit = classify(&event.target);
        if !hit.plugin_control {
            match hit.element_id.filter(|id| ctx.store.element(*id).is_some()) {
                Some(id) => ctx.begin_element_drag(id, event.position),
                None => ctx.begin_marquee(event.position),
            }
        }

        for plugin in &mut self.plugins {
            if plugin.on_pointer_down(event, &mut self.ctx).is_claimed() {
                log::trace!("pointer down claimed by {}", plugin.name());
                break;
            }
        }
    }

    /// Pointer moved over the stage container with no gesture running.
    /// Publishes the cursor so other clients can render it.
    pub fn on_pointer_move(&mut self, event: &PointerEvent) {
        self.ctx.pointer_position = event.position;
        if self.ctx.drag.is_some() || self.ctx.panning {
            return;
        }
        let world = self.ctx.camera.screen_to_world(event.position);
        self.ctx.store.set_cursor(self.ctx.client_id, world);
    }

    /// Pointer moved anywhere while a gesture may be running. The host
    /// forwards window-level moves so drags survive leaving the container.
    pub fn on_window_pointer_move(&mut self, event: &PointerEvent) {
        let ctx = &mut self.ctx;
        ctx.pointer_position = event.position;

        if ctx.panning && ctx.pointer_down {
            ctx.camera.pan(event.movement);
        } else if let Some(session) = &ctx.drag {
            let world = ctx.camera.screen_to_world(event.position);
            ctx.store.set_cursor(ctx.client_id, world);
            let delta = session.world_delta(event.position, &ctx.camera);
            match &session.target {
                DragTarget::Elements { initial_rects } => {
                    ctx.store.batch(|store| {
                        for (id, initial) in initial_rects {
                            store.update_element_rect(*id, |rect| {
                                rect.x = initial.x + delta.x;
                                rect.y = initial.y + delta.y;
                            });
                        }
                    });
                }
                DragTarget::Marquee => {
                    ctx.store
                        .set_selection_box(ctx.client_id, marquee_box(session.anchor_world, world));
                }
                // Plugin-owned gestures update in the plugin's own hook.
                DragTarget::Resize { .. } | DragTarget::Connection { .. } => {}
            }
        }

        for plugin in &mut self.plugins {
            if plugin
                .on_window_pointer_move(event, &mut self.ctx)
                .is_claimed()
            {
                break;
            }
        }
    }

    /// Pointer button released anywhere.
    ///
    /// Plugins run before the drag session is cleared so they can read the
    /// gesture they started (a wire drop needs its origin port).
    pub fn on_window_pointer_up(&mut self, event: &PointerEvent) {
        let ctx = &mut self.ctx;
        ctx.pointer_down = false;
        if event.button == MouseButton::Middle {
            ctx.panning = false;
        }

        if matches!(
            ctx.drag.as_ref().map(|s| &s.target),
            Some(DragTarget::Marquee)
        ) {
            ctx.finalize_marquee();
        }

        for plugin in &mut self.plugins {
            if plugin.on_window_pointer_up(event, &mut self.ctx).is_claimed() {
                log::trace!("pointer up claimed by {}", plugin.name());
                break;
            }
        }

        self.ctx.drag = None;
    }

    /// Key pressed while the stage has focus.
    pub fn on_key_down(&mut self, event: &KeyboardEvent) {
        {
            let ctx = &mut self.ctx;
            match event.key.as_str() {
                " " if ctx.drag.is_none() => ctx.panning = true,
                "=" if event.modifiers.command() => ctx.zoom_in(),
                "-" if event.modifiers.command() => ctx.zoom_out(),
                _ => {}
            }
        }

        for plugin in &mut self.plugins {
            if plugin.on_key_down(event, &mut self.ctx).is_claimed() {
                break;
            }
        }
    }

    pub fn on_key_up(&mut self, event: &KeyboardEvent) {
        if event.key == " " {
            self.ctx.panning = false;
        }

        for plugin in &mut self.plugins {
            if plugin.on_key_up(event, &mut self.ctx).is_claimed() {
                break;
            }
        }
    }

    /// Wheel scrolled over the stage: pans the camera, or zooms around the
    /// cursor when the command modifier is held.
    pub fn on_wheel(&mut self, event: &WheelEvent) {
        {
            let ctx = &mut self.ctx;
            if event.modifiers.command() {
                let factor = (-event.delta.y * WHEEL_ZOOM_SENSITIVITY).exp();
                ctx.camera.zoom_at(event.position, factor);
            } else {
                ctx.camera.pan(-event.delta);
            }
        }

        for plugin in &mut self.plugins {
            if plugin.on_wheel(event, &mut self.ctx).is_claimed() {
                break;
            }
        }
    }

    /// Advance the in-flight camera transition, if any.
    pub fn tick(&mut self, dt: Duration) {
        self.ctx.advance_transition(dt);
    }

    // --- rendering ---

    /// Build the frame for the current state.
    ///
    /// View order, back to front: plugin back slots, elements by z-index,
    /// this client's marquee box, plugin front slots. While a marquee is
    /// visible the element layer is made passive so the growing box never
    /// steals hover targets.
    pub fn render(&self) -> Frame {
        let ctx = &self.ctx;
        let mut frame = Frame::default();
        (self.background)(ctx, &mut frame.background);

        for plugin in &self.plugins {
            plugin.view_back(ctx, &mut frame.view);
        }

        let marquee = ctx
            .store
            .selection_box(ctx.client_id)
            .filter(|b| !b.hidden);
        let selected = ctx.store.selected_elements(ctx.client_id);

        let mut elements = Scene::new();
        for (id, element) in ctx.store.elements_by_z() {
            let renderer = self.renderers.get(&element.element_type);
            elements.group(TagSet::element(id), |group| {
                if let Some(renderer) = renderer {
                    renderer(id, &element, selected.contains(&id), ctx, group);
                }
            });
        }
        if marquee.is_some() {
            elements.make_passive();
        }
        frame.view.append(elements);

        if let Some(b) = marquee {
            frame.view.push(
                Primitive::rect(Rect::new(b.x, b.y, b.x + b.width, b.y + b.height))
                    .filled(marquee_fill())
                    .stroked(accent_color(), 1.0)
                    .passive(),
            );
        }

        for plugin in &self.plugins {
            plugin.view_front(ctx, &mut frame.view);
        }
        frame
    }

    /// Resolve the tag path under a screen point against a rendered frame.
    /// This is what the host feeds back as [`PointerEvent::target`].
    pub fn hit_test(&self, frame: &Frame, screen_point: Point) -> HitPath {
        let world = self.ctx.camera.screen_to_world(screen_point);
        pick(&frame.view, world)
    }
}

/// The stock background: a light line grid that tracks the camera, spaced
/// [`GRID_SIZE`] world units apart.
fn default_background(ctx: &StageContext, scene: &mut Scene) {
    let width = ctx.container_size.width;
    let height = ctx.container_size.height;
    scene.push(
        Primitive::rect(Rect::new(0.0, 0.0, width, height))
            .filled(rgb(255, 255, 255))
            .passive(),
    );

    let spacing = GRID_SIZE * ctx.camera.zoom;
    if spacing < 1.0 {
        return;
    }

    let mut lines = BezPath::new();
    let mut x = ctx.camera.offset.x.rem_euclid(spacing);
    while x <= width {
        lines.move_to((x, 0.0));
        lines.line_to((x, height));
        x += spacing;
    }
    let mut y = ctx.camera.offset.y.rem_euclid(spacing);
    while y <= height {
        lines.move_to((0.0, y));
        lines.line_to((width, y));
        y += spacing;
    }
    scene.push(Primitive::path(lines).stroked(rgb(238, 238, 238), 1.0).passive());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::NewElement;
    use crate::plugin::EventOutcome;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect_renderer(
        _id: ElementId,
        element: &Element,
        _selected: bool,
        _ctx: &StageContext,
        scene: &mut Scene,
    ) {
        scene.push(Primitive::rect(element.rect.bounds()).filled(rgb(200, 200, 200)));
    }

    fn stage_with_elements() -> (Stage, ElementId, ElementId) {
        let store = StageStore::new();
        let ids = store.create_initial_elements(vec![
            NewElement::new("node", 50.0, 50.0, 100.0, 100.0),
            NewElement::new("node", 400.0, 200.0, 100.0, 100.0),
        ]);
        let mut stage = Stage::new(store);
        stage.set_container_size(500.0, 500.0);
        stage.register_renderer("node", rect_renderer);
        (stage, ids[0], ids[1])
    }

    fn down_on(stage: &mut Stage, screen: Point) {
        let frame = stage.render();
        let target = stage.hit_test(&frame, screen);
        stage.on_pointer_down(&PointerEvent::new(screen).with_target(target));
    }

    #[test]
    fn test_click_selects_and_brings_to_front() {
        let (mut stage, a, b) = stage_with_elements();
        let client = stage.client_id();

        down_on(&mut stage, Point::new(100.0, 100.0));
        assert_eq!(stage.store().selected_elements(client), vec![a]);
        assert_eq!(stage.store().element_rect(a).unwrap().z_index, 2);

        stage.on_window_pointer_up(&PointerEvent::new(Point::new(100.0, 100.0)));

        down_on(&mut stage, Point::new(450.0, 250.0));
        assert_eq!(stage.store().selected_elements(client), vec![b]);
        assert_eq!(stage.store().element_rect(b).unwrap().z_index, 3);
    }

    #[test]
    fn test_click_on_selected_element_keeps_selection() {
        let (mut stage, a, b) = stage_with_elements();
        let client = stage.client_id();
        stage.store().set_selection(client, vec![a, b]);
        let z_before = stage.store().element_rect(a).unwrap().z_index;

        down_on(&mut stage, Point::new(100.0, 100.0));
        assert_eq!(stage.store().selected_elements(client), vec![a, b]);
        // No promotion when the element was already selected.
        assert_eq!(stage.store().element_rect(a).unwrap().z_index, z_before);
    }

    #[test]
    fn test_drag_moves_all_selected_from_initial_rects() {
        let (mut stage, a, b) = stage_with_elements();
        let client = stage.client_id();
        stage.store().set_selection(client, vec![a, b]);

        down_on(&mut stage, Point::new(100.0, 100.0));
        // Two moves; the second must apply the total delta to the initial
        // rects, not accumulate on top of the first.
        stage.on_window_pointer_move(&PointerEvent::new(Point::new(110.0, 100.0)));
        stage.on_window_pointer_move(&PointerEvent::new(Point::new(130.0, 120.0)));
        stage.on_window_pointer_up(&PointerEvent::new(Point::new(130.0, 120.0)));

        let ra = stage.store().element_rect(a).unwrap();
        let rb = stage.store().element_rect(b).unwrap();
        assert!((ra.x - 80.0).abs() < f64::EPSILON);
        assert!((ra.y - 70.0).abs() < f64::EPSILON);
        assert!((rb.x - 430.0).abs() < f64::EPSILON);
        assert!((rb.y - 220.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_drag_delta_respects_zoom() {
        let (mut stage, a, _) = stage_with_elements();
        stage.context_mut().camera.zoom = 2.0;

        down_on(&mut stage, Point::new(200.0, 200.0));
        stage.on_window_pointer_move(&PointerEvent::new(Point::new(240.0, 200.0)));
        stage.on_window_pointer_up(&PointerEvent::new(Point::new(240.0, 200.0)));

        // 40 screen pixels at zoom 2 is 20 world units.
        let rect = stage.store().element_rect(a).unwrap();
        assert!((rect.x - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_marquee_selects_overlapped_and_hides_box() {
        let (mut stage, a, _) = stage_with_elements();
        let client = stage.client_id();

        down_on(&mut stage, Point::new(10.0, 10.0));
        stage.on_window_pointer_move(&PointerEvent::new(Point::new(200.0, 200.0)));

        let sbox = stage.store().selection_box(client).unwrap();
        assert!(!sbox.hidden);
        assert!((sbox.width - 190.0).abs() < f64::EPSILON);

        stage.on_window_pointer_up(&PointerEvent::new(Point::new(200.0, 200.0)));
        assert_eq!(stage.store().selected_elements(client), vec![a]);
        assert!(stage.store().selection_box(client).unwrap().hidden);
        assert!(stage.context().drag.is_none());
    }

    #[test]
    fn test_marquee_touching_edges_does_not_select() {
        let (mut stage, _, _) = stage_with_elements();
        let client = stage.client_id();

        // Box ends exactly at the element's left edge at x=50.
        down_on(&mut stage, Point::new(10.0, 10.0));
        stage.on_window_pointer_move(&PointerEvent::new(Point::new(50.0, 300.0)));
        stage.on_window_pointer_up(&PointerEvent::new(Point::new(50.0, 300.0)));

        assert!(stage.store().selected_elements(client).is_empty());
    }

    #[test]
    fn test_background_click_clears_selection() {
        let (mut stage, a, _) = stage_with_elements();
        let client = stage.client_id();
        stage.store().set_selection(client, vec![a]);

        down_on(&mut stage, Point::new(300.0, 400.0));
        assert!(stage.store().selected_elements(client).is_empty());
        stage.on_window_pointer_up(&PointerEvent::new(Point::new(300.0, 400.0)));
    }

    #[test]
    fn test_middle_button_pans() {
        let (mut stage, _, _) = stage_with_elements();
        stage.on_pointer_down(
            &PointerEvent::new(Point::new(100.0, 100.0)).with_button(MouseButton::Middle),
        );
        stage.on_window_pointer_move(
            &PointerEvent::new(Point::new(110.0, 95.0)).with_movement(Vec2::new(10.0, -5.0)),
        );
        stage.on_window_pointer_up(
            &PointerEvent::new(Point::new(110.0, 95.0)).with_button(MouseButton::Middle),
        );

        let camera = stage.camera();
        assert!((camera.offset.x - 10.0).abs() < f64::EPSILON);
        assert!((camera.offset.y + 5.0).abs() < f64::EPSILON);
        assert!(!stage.context().panning);
    }

    #[test]
    fn test_space_pan_takes_priority_over_element_drag() {
        let (mut stage, a, _) = stage_with_elements();
        stage.on_key_down(&KeyboardEvent::new(" "));
        assert!(stage.context().panning);

        down_on(&mut stage, Point::new(100.0, 100.0));
        stage.on_window_pointer_move(
            &PointerEvent::new(Point::new(120.0, 100.0)).with_movement(Vec2::new(20.0, 0.0)),
        );

        // The camera moved, the element did not.
        assert!((stage.camera().offset.x - 20.0).abs() < f64::EPSILON);
        assert!((stage.store().element_rect(a).unwrap().x - 50.0).abs() < f64::EPSILON);

        stage.on_window_pointer_up(&PointerEvent::new(Point::new(120.0, 100.0)));
        stage.on_key_up(&KeyboardEvent::new(" "));
        assert!(!stage.context().panning);
    }

    #[test]
    fn test_wheel_pans_against_delta() {
        let (mut stage, _, _) = stage_with_elements();
        stage.on_wheel(&WheelEvent {
            position: Point::new(250.0, 250.0),
            delta: Vec2::new(30.0, -10.0),
            modifiers: Default::default(),
        });
        assert!((stage.camera().offset.x + 30.0).abs() < f64::EPSILON);
        assert!((stage.camera().offset.y - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_command_wheel_zooms_at_cursor() {
        let (mut stage, _, _) = stage_with_elements();
        let cursor = Point::new(100.0, 100.0);
        let world_before = stage.camera().screen_to_world(cursor);

        stage.on_wheel(&WheelEvent {
            position: cursor,
            delta: Vec2::new(0.0, -40.0),
            modifiers: crate::input::Modifiers { ctrl: true, ..Default::default() },
        });

        assert!(stage.camera().zoom > 1.0);
        let world_after = stage.camera().screen_to_world(cursor);
        assert!((world_before.x - world_after.x).abs() < 1e-9);
        assert!((world_before.y - world_after.y).abs() < 1e-9);
    }

    #[test]
    fn test_hover_publishes_cursor_in_world_space() {
        let (mut stage, _, _) = stage_with_elements();
        let client = stage.client_id();
        stage.context_mut().camera.zoom = 2.0;

        stage.on_pointer_move(&PointerEvent::new(Point::new(100.0, 60.0)));
        let cursor = stage.store().cursor(client).unwrap();
        assert!((cursor.x - 50.0).abs() < f64::EPSILON);
        assert!((cursor.y - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_render_marquee_makes_elements_passive() {
        let (mut stage, _, _) = stage_with_elements();

        down_on(&mut stage, Point::new(10.0, 10.0));
        stage.on_window_pointer_move(&PointerEvent::new(Point::new(300.0, 300.0)));

        // With the box visible, the element under (100,100) must not be
        // pickable anymore.
        let frame = stage.render();
        let path = stage.hit_test(&frame, Point::new(100.0, 100.0));
        assert!(classify(&path).is_background());

        stage.on_window_pointer_up(&PointerEvent::new(Point::new(300.0, 300.0)));
        let frame = stage.render();
        let path = stage.hit_test(&frame, Point::new(100.0, 100.0));
        assert!(classify(&path).element_id.is_some());
    }

    #[test]
    fn test_render_default_background_has_grid() {
        let (stage, _, _) = stage_with_elements();
        let frame = stage.render();
        // Backdrop plus grid lines.
        assert!(frame.background.primitive_count() >= 2);
    }

    struct ClaimingPlugin {
        log: Rc<RefCell<Vec<&'static str>>>,
        tag: &'static str,
        claim: bool,
    }

    impl StagePlugin for ClaimingPlugin {
        fn name(&self) -> &str {
            self.tag
        }

        fn on_pointer_down(&mut self, _: &PointerEvent, _: &mut StageContext) -> EventOutcome {
            self.log.borrow_mut().push(self.tag);
            if self.claim {
                EventOutcome::Claimed
            } else {
                EventOutcome::Pass
            }
        }
    }

    #[test]
    fn test_claim_short_circuits_later_plugins() {
        let (mut stage, _, _) = stage_with_elements();
        let calls = Rc::new(RefCell::new(Vec::new()));
        stage.add_plugin(ClaimingPlugin { log: calls.clone(), tag: "first", claim: false });
        stage.add_plugin(ClaimingPlugin { log: calls.clone(), tag: "second", claim: true });
        stage.add_plugin(ClaimingPlugin { log: calls.clone(), tag: "third", claim: false });

        stage.on_pointer_down(&PointerEvent::new(Point::new(300.0, 400.0)));
        assert_eq!(*calls.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn test_tick_applies_immediate_transition() {
        let (mut stage, _, _) = stage_with_elements();
        let target = CameraPose { x: 12.0, y: -3.0, zoom: 1.5 };
        stage.context_mut().animate_camera_to(target);
        assert!((stage.camera().zoom - 1.0).abs() < f64::EPSILON);

        stage.tick(Duration::from_millis(16));
        assert!((stage.camera().zoom - 1.5).abs() < f64::EPSILON);
        assert!((stage.camera().offset.x - 12.0).abs() < f64::EPSILON);
    }
}
