//! Touch and mouse gestures mapped onto globe camera operations.
//!
//! Platforms report raw pointer events differently, so the host translates
//! them into [`GestureEvent`]s and feeds them to a [`GestureAdapter`]. The
//! adapter tracks the current transform mode and calls the matching
//! [`GlobeEngine`] operation:
//!
//! - one finger down, then move: drag-rotate
//! - second finger down ([`GestureEvent::ScaleBegin`]), then spread or pinch:
//!   zoom by changing the field of view, `fov = start_fov · start_span / span`
//! - two-finger rotation: twist about the view axis
//! - tap: overlay hit test
//!
//! Zoom requests outside the field-of-view bounds are dropped; the globe stays
//! at the last accepted zoom.

use crate::engine::GlobeEngine;
use crate::math::Vec2;
use crate::overlay::OverlayId;

/// A platform-neutral input gesture. Positions are top-down screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// First pointer touched down.
    Down { position: Vec2 },
    /// The primary pointer moved.
    Move { position: Vec2 },
    /// All pointers lifted.
    Up,
    /// A fling or scroll already reduced to a distance.
    Scroll { distance: Vec2 },
    /// A second pointer touched down; `span` is the distance between them.
    ScaleBegin { span: f32 },
    /// The pointers moved; `span` is their current distance.
    Scale { span: f32 },
    /// The pointers rotated around each other.
    Twist { degrees: f32 },
    /// A short press without movement.
    Tap { position: Vec2 },
}

/// What the adapter is currently doing with pointer movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransformMode {
    #[default]
    None,
    Drag,
    Zoom,
}

/// What a gesture did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureResponse {
    /// Nothing changed.
    Ignored,
    /// The adapter's mode changed; the camera did not.
    Tracking,
    Rotated,
    Zoomed,
    /// A zoom step fell outside the field-of-view bounds.
    ZoomRejected,
    Selected(OverlayId),
    /// A tap hit no overlay.
    Missed,
}

/// Turns [`GestureEvent`]s into camera changes on a [`GlobeEngine`].
#[derive(Debug, Clone)]
pub struct GestureAdapter {
    density: f32,
    mode: TransformMode,
    last_position: Vec2,
    start_fov: f32,
    start_span: f32,
}

impl GestureAdapter {
    /// `density` is the display's pixels per point.
    pub fn new(density: f32) -> Self {
        Self {
            density,
            mode: TransformMode::None,
            last_position: Vec2::ZERO,
            start_fov: 0.0,
            start_span: 0.0,
        }
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn set_density(&mut self, density: f32) {
        self.density = density;
    }

    pub fn handle(&mut self, engine: &mut GlobeEngine, event: GestureEvent) -> GestureResponse {
        match event {
            GestureEvent::Down { position } => {
                self.mode = TransformMode::Drag;
                self.last_position = position;
                GestureResponse::Tracking
            }
            GestureEvent::Move { position } => {
                if self.mode != TransformMode::Drag {
                    return GestureResponse::Ignored;
                }
                let distance = position - self.last_position;
                self.last_position = position;
                engine.rotate_drag(distance, self.density);
                GestureResponse::Rotated
            }
            GestureEvent::Up => {
                self.mode = TransformMode::None;
                GestureResponse::Tracking
            }
            GestureEvent::Scroll { distance } => {
                engine.rotate_drag(distance, self.density);
                GestureResponse::Rotated
            }
            GestureEvent::ScaleBegin { span } => {
                if !(span > 0.0 && span.is_finite()) {
                    return GestureResponse::Ignored;
                }
                self.mode = TransformMode::Zoom;
                self.start_span = span;
                self.start_fov = engine.field_of_view();
                GestureResponse::Tracking
            }
            GestureEvent::Scale { span } => {
                if self.mode != TransformMode::Zoom {
                    return GestureResponse::Ignored;
                }
                let fov = self.start_fov * (self.start_span / span);
                log::debug!("pinch span {span}: fov {fov}");
                if engine.set_field_of_view(fov) {
                    GestureResponse::Zoomed
                } else {
                    GestureResponse::ZoomRejected
                }
            }
            GestureEvent::Twist { degrees } => {
                engine.rotate_twist(degrees, self.density);
                GestureResponse::Rotated
            }
            GestureEvent::Tap { position } => match engine.overlay_at(position) {
                Some(id) => {
                    log::debug!("tap at {position} selected overlay {}", id.index());
                    GestureResponse::Selected(id)
                }
                None => GestureResponse::Missed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobeConfig;
    use crate::math::{Mat4, Vec3};
    use crate::overlay::Overlay;
    use crate::render::RecordingBackend;

    fn engine() -> GlobeEngine {
        let mut engine = GlobeEngine::new(GlobeConfig {
            stacks: 8,
            slices: 8,
            ..GlobeConfig::default()
        })
        .unwrap();
        engine.create_surface(&mut RecordingBackend::new());
        engine.update_surface(800, 600);
        engine
    }

    #[test]
    fn drag_rotates_by_pointer_delta() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(2.0);

        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Down { position: Vec2::new(100.0, 100.0) }),
            GestureResponse::Tracking
        );
        assert_eq!(adapter.mode(), TransformMode::Drag);
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Move { position: Vec2::new(180.0, 100.0) }),
            GestureResponse::Rotated
        );

        // 80 px / density 2 / damping 4 = 10 degrees about Y.
        let expected = Mat4::from_rotation_y(10f32.to_radians());
        assert!(engine.camera().rotation().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn move_without_down_is_ignored() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        let response = adapter.handle(&mut engine, GestureEvent::Move { position: Vec2::ONE });
        assert_eq!(response, GestureResponse::Ignored);
        assert_eq!(engine.camera().rotation(), Mat4::IDENTITY);
    }

    #[test]
    fn pinch_scales_fov_by_span_ratio() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        adapter.handle(&mut engine, GestureEvent::Down { position: Vec2::ZERO });
        adapter.handle(&mut engine, GestureEvent::ScaleBegin { span: 100.0 });
        assert_eq!(adapter.mode(), TransformMode::Zoom);

        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Scale { span: 200.0 }),
            GestureResponse::Zoomed
        );
        assert_eq!(engine.field_of_view(), 15.0);

        // Ratios are taken from the span at ScaleBegin, not the last step.
        adapter.handle(&mut engine, GestureEvent::Scale { span: 50.0 });
        assert_eq!(engine.field_of_view(), 60.0);
    }

    #[test]
    fn out_of_bounds_pinch_leaves_fov_untouched() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        adapter.handle(&mut engine, GestureEvent::ScaleBegin { span: 100.0 });

        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Scale { span: 1000.0 }),
            GestureResponse::ZoomRejected
        );
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Scale { span: 10.0 }),
            GestureResponse::ZoomRejected
        );
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Scale { span: 0.0 }),
            GestureResponse::ZoomRejected
        );
        assert_eq!(engine.field_of_view(), 30.0);
    }

    #[test]
    fn zoom_mode_does_not_drag() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        adapter.handle(&mut engine, GestureEvent::Down { position: Vec2::ZERO });
        adapter.handle(&mut engine, GestureEvent::ScaleBegin { span: 100.0 });
        let response = adapter.handle(&mut engine, GestureEvent::Move { position: Vec2::splat(50.0) });
        assert_eq!(response, GestureResponse::Ignored);
        assert_eq!(engine.camera().rotation(), Mat4::IDENTITY);
    }

    #[test]
    fn up_ends_the_gesture() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        adapter.handle(&mut engine, GestureEvent::ScaleBegin { span: 100.0 });
        adapter.handle(&mut engine, GestureEvent::Up);
        assert_eq!(adapter.mode(), TransformMode::None);
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Scale { span: 120.0 }),
            GestureResponse::Ignored
        );
    }

    #[test]
    fn degenerate_span_does_not_start_zoom() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::ScaleBegin { span: 0.0 }),
            GestureResponse::Ignored
        );
        assert_eq!(adapter.mode(), TransformMode::None);
    }

    #[test]
    fn twist_and_scroll_rotate() {
        let mut engine = engine();
        let mut adapter = GestureAdapter::new(1.0);
        adapter.handle(&mut engine, GestureEvent::Twist { degrees: 90.0 });
        let twisted = engine.camera().rotation();
        assert!(twisted.abs_diff_eq(Mat4::from_rotation_z(90f32.to_radians()), 1e-6));

        adapter.handle(&mut engine, GestureEvent::Scroll { distance: Vec2::new(0.0, 40.0) });
        assert_ne!(engine.camera().rotation(), twisted);
    }

    #[test]
    fn tap_selects_overlay() {
        let mut engine = engine();
        let id = engine.add_overlay(Overlay::new(Vec3::Z));
        let mut adapter = GestureAdapter::new(1.0);
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Tap { position: Vec2::new(400.0, 300.0) }),
            GestureResponse::Selected(id)
        );
        assert_eq!(
            adapter.handle(&mut engine, GestureEvent::Tap { position: Vec2::new(10.0, 10.0) }),
            GestureResponse::Missed
        );
    }
}
