//! End-to-end globe scenarios driven through the recording backend.

use orbis::prelude::*;
use orbis::render::BackendCall;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;

/// A 64x64 8-bit BFF2 atlas with 8x16 cells, every glyph 6 pixels wide.
fn font_blob() -> Vec<u8> {
    let mut blob = vec![0xBF, 0xF2];
    for value in [64i32, 64, 8, 16] {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob.push(8);
    blob.push(32);
    blob.extend_from_slice(&[6u8; 256]);
    blob.extend(std::iter::repeat_n(255u8, 64 * 64));
    blob
}

fn globe() -> (GlobeEngine, RecordingBackend) {
    let config = GlobeConfig::from_json_str(r#"{ "stacks": 10, "slices": 10 }"#).unwrap();
    let mut engine = GlobeEngine::new(config).unwrap();
    let mut backend = RecordingBackend::new();
    engine.create_surface(&mut backend);
    engine.update_surface(WIDTH, HEIGHT);
    (engine, backend)
}

fn center() -> Vec2 {
    Vec2::new(WIDTH as f32 / 2.0, HEIGHT as f32 / 2.0)
}

#[test]
fn overlay_at_origin_lands_at_viewport_center() {
    let (mut engine, mut backend) = globe();
    let zero = engine.add_overlay(Overlay::geodetic(0.0, 0.0, 1.0));

    engine.render_frame(&mut backend).unwrap();

    let frame = backend.last_frame().unwrap();
    assert_eq!(frame.vertex_count, (10 * 2 + 2) * 10);
    assert_eq!(frame.viewport, Viewport::new(WIDTH, HEIGHT));
    assert_eq!(frame.billboards.len(), 1);

    let dot = &frame.billboards[0];
    assert_eq!(dot.overlay, zero);
    assert!(dot.center.abs_diff_eq(center(), 0.5), "{:?}", dot.center);
    // Planet at distance 10, anchor on the near surface.
    assert!((dot.depth - 9.0).abs() < 1e-4);
}

#[test]
fn pending_texture_is_swapped_once_before_submit() {
    let (mut engine, mut backend) = globe();
    backend.clear();

    let earth = TextureHandle::new(7);
    engine.update_texture(earth);
    engine.render_frame(&mut backend).unwrap();
    engine.render_frame(&mut backend).unwrap();

    assert!(matches!(backend.calls[0], BackendCall::SwapGlobeTexture(t) if t == earth));
    assert!(matches!(backend.calls[1], BackendCall::Submit(_)));
    let swaps = backend
        .calls
        .iter()
        .filter(|call| matches!(call, BackendCall::SwapGlobeTexture(_)))
        .count();
    assert_eq!(swaps, 1);
    assert!(backend.frames().all(|f| f.globe_texture == Some(earth)));
}

#[test]
fn label_is_centered_above_its_dot() {
    let (mut engine, mut backend) = globe();
    let font = engine.load_font(font_blob().as_slice()).unwrap();
    engine.add_overlay(Overlay::geodetic(0.0, 0.0, 1.0).with_label("Zero").with_font(font));

    engine.render_frame(&mut backend).unwrap();

    let frame = backend.last_frame().unwrap();
    let dot = frame.billboards[0];
    let label = &frame.labels[0];
    assert_eq!(label.glyphs.len(), 4);
    assert_eq!(label.color, Color::rgba(1.0, 0.5, 0.5, 1.0));

    let first = &label.glyphs[0];
    let last = &label.glyphs[3];
    let left_gap = dot.center.x - first.origin.x;
    let right_gap = last.origin.x + last.size.x - dot.center.x;
    assert!((left_gap - right_gap).abs() <= 1.0, "{left_gap} vs {right_gap}");

    assert!((first.origin.y - (dot.center.y + first.size.y / 2.0)).abs() < 1e-3);
    assert_eq!(first.origin.z, -10.0);
}

#[test]
fn drag_moves_overlay_and_half_turn_hides_it() {
    let (mut engine, mut backend) = globe();
    engine.add_overlay(Overlay::geodetic(0.0, 0.0, 1.0));
    let mut gestures = GestureAdapter::new(1.0);

    gestures.handle(&mut engine, GestureEvent::Down { position: center() });
    gestures.handle(&mut engine, GestureEvent::Move { position: center() + Vec2::new(80.0, 0.0) });
    engine.render_frame(&mut backend).unwrap();
    let moved = backend.last_frame().unwrap().billboards[0].center;
    assert!(moved.x > center().x + 1.0, "{moved:?}");

    // 720 px at density 1 and damping 4 completes a half turn.
    gestures.handle(&mut engine, GestureEvent::Move { position: center() + Vec2::new(720.0, 0.0) });
    gestures.handle(&mut engine, GestureEvent::Up);
    engine.render_frame(&mut backend).unwrap();
    assert!(backend.last_frame().unwrap().billboards.is_empty());
    #[cfg(feature = "diagnostics")]
    assert_eq!(engine.frame_stats().overlays_culled, 1);
}

#[test]
fn tap_selects_visible_overlay_only() {
    let (mut engine, _backend) = globe();
    let zero = engine.add_overlay(Overlay::geodetic(0.0, 0.0, 1.0));
    let mut gestures = GestureAdapter::new(1.0);

    assert_eq!(
        gestures.handle(&mut engine, GestureEvent::Tap { position: center() }),
        GestureResponse::Selected(zero)
    );
    assert_eq!(
        gestures.handle(&mut engine, GestureEvent::Tap { position: Vec2::new(5.0, 5.0) }),
        GestureResponse::Missed
    );

    engine.rotate_drag(Vec2::new(720.0, 0.0), 1.0);
    assert_eq!(
        gestures.handle(&mut engine, GestureEvent::Tap { position: center() }),
        GestureResponse::Missed
    );
}

#[test]
fn pinch_zoom_grows_the_dot() {
    let (mut engine, mut backend) = globe();
    engine.add_overlay(Overlay::geodetic(0.0, 0.0, 1.0));
    engine.render_frame(&mut backend).unwrap();
    let before = backend.last_frame().unwrap().billboards[0].size;

    let mut gestures = GestureAdapter::new(1.0);
    gestures.handle(&mut engine, GestureEvent::ScaleBegin { span: 100.0 });
    assert_eq!(
        gestures.handle(&mut engine, GestureEvent::Scale { span: 150.0 }),
        GestureResponse::Zoomed
    );
    assert!((engine.field_of_view() - 20.0).abs() < 1e-4);

    engine.render_frame(&mut backend).unwrap();
    let after = backend.last_frame().unwrap().billboards[0].size;
    assert!(after.x > before.x && after.y > before.y);
}

#[test]
fn rendering_requires_a_sized_surface() {
    let mut engine = GlobeEngine::default();
    let mut backend = RecordingBackend::new();
    assert_eq!(engine.render_frame(&mut backend), Err(EngineError::SurfaceNotCreated));

    engine.create_surface(&mut backend);
    assert_eq!(engine.render_frame(&mut backend), Err(EngineError::SurfaceNotSized));

    engine.update_surface(WIDTH, HEIGHT);
    assert_eq!(engine.render_frame(&mut backend), Ok(()));
    assert_eq!(engine.frames_rendered(), 1);
}
