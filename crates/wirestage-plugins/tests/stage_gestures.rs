//! End-to-end gesture tests over a fully assembled stage: real render
//! passes, hit-testing against the produced frame, and the default plugin
//! set. This is the closed loop a host runs: render, pick, feed events.

use kurbo::{Point, Vec2};
use std::time::Duration;

use wirestage_core::element::NewElement;
use wirestage_core::hit::{CONNECTION_POINT_TAG, RESIZE_DIR_TAG};
use wirestage_core::input::{Modifiers, PointerEvent, WheelEvent};
use wirestage_core::scene::Primitive;
use wirestage_core::stage::Stage;
use wirestage_core::store::StageStore;
use wirestage_core::{CenterContentOptions, ElementId};
use wirestage_plugins::{default_plugins, render_connection_points, wires};

fn node_stage() -> (Stage, ElementId, ElementId) {
    let store = StageStore::new();
    let ids = store.create_initial_elements(vec![
        NewElement::new("node", 50.0, 50.0, 100.0, 100.0),
        NewElement::new("node", 400.0, 200.0, 100.0, 100.0),
    ]);
    let mut stage = Stage::new(store);
    stage.set_container_size(500.0, 500.0);
    stage.add_plugins(default_plugins());
    stage.register_renderer("node", |id, element, _selected, _ctx, scene| {
        scene.push(Primitive::rect(element.rect.bounds()).filled(wirestage_core::scene::rgb(226, 232, 240)));
        render_connection_points(id, &element.rect, scene);
    });
    (stage, ids[0], ids[1])
}

fn pointer_down_at(stage: &mut Stage, screen: Point) {
    let frame = stage.render();
    let target = stage.hit_test(&frame, screen);
    stage.on_pointer_down(&PointerEvent::new(screen).with_target(target));
}

fn pointer_up_at(stage: &mut Stage, screen: Point) {
    let frame = stage.render();
    let target = stage.hit_test(&frame, screen);
    stage.on_window_pointer_up(&PointerEvent::new(screen).with_target(target));
}

#[test]
fn center_content_fits_two_nodes() {
    let (mut stage, _, _) = node_stage();
    stage
        .context_mut()
        .center_content(CenterContentOptions::default());

    // Content box [50,50]-[500,300] in a 500x500 viewport, margin 50:
    // the height fit wins at 400/450.
    let camera = stage.camera();
    assert!((camera.zoom - 400.0 / 450.0).abs() < 1e-9);
    let center = camera.world_to_screen(Point::new(275.0, 175.0));
    assert!((center.x - 250.0).abs() < 1e-9);
    assert!((center.y - 250.0).abs() < 1e-9);
}

#[test]
fn click_drag_moves_element_under_fitted_camera() {
    let (mut stage, a, _) = node_stage();
    stage
        .context_mut()
        .center_content(CenterContentOptions::default());
    let client = stage.client_id();

    // A's world center (100, 100) as seen on screen.
    let screen = stage.camera().world_to_screen(Point::new(100.0, 100.0));
    pointer_down_at(&mut stage, screen);
    assert_eq!(stage.store().selected_elements(client), vec![a]);

    let moved = Point::new(screen.x + 45.0, screen.y);
    stage.on_window_pointer_move(&PointerEvent::new(moved));
    pointer_up_at(&mut stage, moved);

    // 45 screen pixels divided by the fitted zoom.
    let expected = 50.0 + 45.0 / (400.0 / 450.0);
    let rect = stage.store().element_rect(a).unwrap();
    assert!((rect.x - expected).abs() < 1e-9);
}

#[test]
fn marquee_selects_both_nodes() {
    let (mut stage, a, b) = node_stage();
    let client = stage.client_id();

    pointer_down_at(&mut stage, Point::new(10.0, 10.0));
    stage.on_window_pointer_move(&PointerEvent::new(Point::new(490.0, 490.0)));
    pointer_up_at(&mut stage, Point::new(490.0, 490.0));

    let selected = stage.store().selected_elements(client);
    assert_eq!(selected.len(), 2);
    assert!(selected.contains(&a) && selected.contains(&b));
    assert!(stage.store().selection_box(client).unwrap().hidden);
}

#[test]
fn resize_gesture_via_rendered_handle() {
    let (mut stage, a, _) = node_stage();
    let client = stage.client_id();

    // Select A, release, then grab its bottom-right handle.
    pointer_down_at(&mut stage, Point::new(100.0, 100.0));
    pointer_up_at(&mut stage, Point::new(100.0, 100.0));
    assert_eq!(stage.store().selected_elements(client), vec![a]);

    let frame = stage.render();
    let handle = stage.hit_test(&frame, Point::new(150.0, 150.0));
    assert_eq!(handle.target_tag(RESIZE_DIR_TAG), Some("bottom right"));
    stage.on_pointer_down(&PointerEvent::new(Point::new(150.0, 150.0)).with_target(handle));
    stage.on_window_pointer_move(&PointerEvent::new(Point::new(190.0, 180.0)));
    pointer_up_at(&mut stage, Point::new(190.0, 180.0));

    let rect = stage.store().element_rect(a).unwrap();
    assert!((rect.width - 140.0).abs() < f64::EPSILON);
    assert!((rect.height - 130.0).abs() < f64::EPSILON);
    // Selection survived the whole gesture.
    assert_eq!(stage.store().selected_elements(client), vec![a]);
}

#[test]
fn wire_gesture_connects_and_deduplicates() {
    let (mut stage, a, b) = node_stage();
    let client = stage.client_id();

    // A's output port sits at world (150, 100), B's input at (400, 250).
    let frame = stage.render();
    let port = stage.hit_test(&frame, Point::new(150.0, 100.0));
    assert_eq!(port.target_tag(CONNECTION_POINT_TAG), Some("output"));
    stage.on_pointer_down(&PointerEvent::new(Point::new(150.0, 100.0)).with_target(port));

    // Grabbing a port must not disturb the (empty) selection or start a
    // marquee.
    assert!(stage.store().selected_elements(client).is_empty());
    assert!(stage.store().selection_box(client).is_none());

    stage.on_window_pointer_move(&PointerEvent::new(Point::new(300.0, 180.0)));
    pointer_up_at(&mut stage, Point::new(400.0, 250.0));

    let all = wires(stage.store());
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].from_element, a);
    assert_eq!(all[0].to_element, b);
    assert!(stage.context().drag.is_none());

    // Same pair again, grabbed from the input side: rejected as duplicate.
    let frame = stage.render();
    let port = stage.hit_test(&frame, Point::new(400.0, 250.0));
    assert_eq!(port.target_tag(CONNECTION_POINT_TAG), Some("input"));
    stage.on_pointer_down(&PointerEvent::new(Point::new(400.0, 250.0)).with_target(port));
    pointer_up_at(&mut stage, Point::new(150.0, 100.0));

    assert_eq!(wires(stage.store()).len(), 1);
}

#[test]
fn wire_dropped_on_background_connects_nothing() {
    let (mut stage, _, _) = node_stage();

    let frame = stage.render();
    let port = stage.hit_test(&frame, Point::new(150.0, 100.0));
    stage.on_pointer_down(&PointerEvent::new(Point::new(150.0, 100.0)).with_target(port));
    stage.on_window_pointer_move(&PointerEvent::new(Point::new(300.0, 400.0)));
    pointer_up_at(&mut stage, Point::new(300.0, 400.0));

    assert!(wires(stage.store()).is_empty());
    assert!(stage.context().drag.is_none());
}

#[test]
fn wire_drag_renders_preview() {
    let (mut stage, _, _) = node_stage();

    let frame = stage.render();
    let before = frame.view.primitive_count();

    let port = stage.hit_test(&frame, Point::new(150.0, 100.0));
    stage.on_pointer_down(&PointerEvent::new(Point::new(150.0, 100.0)).with_target(port));
    stage.on_window_pointer_move(&PointerEvent::new(Point::new(300.0, 180.0)));

    let frame = stage.render();
    assert_eq!(frame.view.primitive_count(), before + 1);

    pointer_up_at(&mut stage, Point::new(300.0, 180.0));
    let frame = stage.render();
    assert_eq!(frame.view.primitive_count(), before);
}

#[test]
fn command_wheel_zoom_clamps_at_range_ends() {
    let (mut stage, _, _) = node_stage();
    let ctrl = Modifiers { ctrl: true, ..Default::default() };

    for _ in 0..200 {
        stage.on_wheel(&WheelEvent {
            position: Point::new(250.0, 250.0),
            delta: Vec2::new(0.0, -100.0),
            modifiers: ctrl,
        });
    }
    assert!((stage.camera().zoom - wirestage_core::MAX_ZOOM).abs() < 1e-9);

    for _ in 0..200 {
        stage.on_wheel(&WheelEvent {
            position: Point::new(250.0, 250.0),
            delta: Vec2::new(0.0, 100.0),
            modifiers: ctrl,
        });
    }
    assert!((stage.camera().zoom - wirestage_core::MIN_ZOOM).abs() < 1e-9);
}

#[test]
fn zoom_actions_animate_through_tick() {
    let (mut stage, _, _) = node_stage();
    stage.context_mut().zoom_in();
    assert!((stage.camera().zoom - 1.0).abs() < f64::EPSILON);

    stage.tick(Duration::from_millis(16));
    assert!((stage.camera().zoom - wirestage_core::ZOOM_STEP).abs() < 1e-9);
}
