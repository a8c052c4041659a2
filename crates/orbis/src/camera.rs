//! # Camera — Rotation, Field of View, and the Frustum
//!
//! The eye sits at the origin looking down -Z. The planet sits at a fixed
//! point in front of it, and all interaction turns the *planet*: drags and
//! twists are accumulated into a rotation matrix applied after the
//! translation.
//!
//! ```text
//!   model = translate(planet) · rotation
//!   proj  = frustum(-h, h, -h/aspect, h/aspect, near, far)
//!   h     = near · tan(fov / 180)
//! ```
//!
//! ## Drag and Twist
//!
//! A drag of `(dx, dy)` pixels turns the globe by `dx / density / damping`
//! degrees about Y and `dy / density / damping` about X, where `density` is
//! the display's pixels-per-point. Each new increment is applied in eye space
//! (premultiplied): dragging right spins the visible face right no matter how
//! the globe is already oriented.
//!
//! ## Field of View
//!
//! `fov / 180` is used as the tangent argument in radians: the "fov" value
//! doubles as a zoom dial rather than a literal angle. At the default of 30 it
//! gives a half-height of `near · tan(1/6)`. Requests outside the configured
//! bounds are ignored and reported with `false`.

use crate::config::GlobeConfig;
use crate::math::{Mat4, Vec2, Vec3, Viewport, frustum};

/// View state for the globe: accumulated rotation, field of view, viewport.
#[derive(Debug, Clone)]
pub struct Camera {
    field_of_view: f32,
    min_fov: f32,
    max_fov: f32,
    rotation: Mat4,
    planet_position: Vec3,
    viewport: Viewport,
    near: f32,
    far: f32,
    drag_damping: f32,
}

impl Camera {
    pub fn new(config: &GlobeConfig) -> Self {
        Self {
            field_of_view: config.default_fov,
            min_fov: config.min_fov,
            max_fov: config.max_fov,
            rotation: Mat4::IDENTITY,
            planet_position: Vec3::new(0.0, 0.0, -config.planet_distance),
            viewport: Viewport::default(),
            near: config.near_clip,
            far: config.far_clip,
            drag_damping: config.drag_damping,
        }
    }

    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Set the field of view if it lies within the configured bounds.
    ///
    /// Returns whether the value was accepted. NaN is always rejected.
    pub fn set_field_of_view(&mut self, fov: f32) -> bool {
        if fov >= self.min_fov && fov <= self.max_fov {
            self.field_of_view = fov;
            true
        } else {
            false
        }
    }

    pub(crate) fn reset_field_of_view(&mut self, fov: f32) {
        self.field_of_view = fov;
    }

    /// Turn the globe by a drag distance in pixels.
    pub fn rotate_drag(&mut self, distance: Vec2, density: f32) {
        let dx = distance.x / density / self.drag_damping;
        let dy = distance.y / density / self.drag_damping;
        // Composing with an identity turn can still flip signed zeros.
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        self.rotation = Mat4::from_rotation_y(dx.to_radians())
            * Mat4::from_rotation_x(dy.to_radians())
            * self.rotation;
    }

    /// Turn the globe about the view axis by `angle / density` degrees.
    pub fn rotate_twist(&mut self, angle: f32, density: f32) {
        let degrees = angle / density;
        if degrees == 0.0 {
            return;
        }
        self.rotation = Mat4::from_rotation_z(degrees.to_radians()) * self.rotation;
    }

    /// The accumulated rotation.
    pub fn rotation(&self) -> Mat4 {
        self.rotation
    }

    pub fn planet_position(&self) -> Vec3 {
        self.planet_position
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Half-width of the near plane: `near · tan(fov / 180)`.
    pub fn frustum_half_extent(&self) -> f32 {
        self.near * (self.field_of_view / 180.0).tan()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let half = self.frustum_half_extent();
        let aspect = self.viewport.aspect_ratio();
        frustum(-half, half, -half / aspect, half / aspect, self.near, self.far)
    }

    /// `translate(planet) · rotation`.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.planet_position) * self.rotation
    }

    /// Scale factor for on-screen overlay sizes, `near / tan(fov / 180)`.
    pub fn globe_scale(&self) -> f32 {
        self.near / (self.field_of_view / 180.0).tan()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;

    fn camera() -> Camera {
        let mut camera = Camera::new(&GlobeConfig::default());
        camera.set_viewport(Viewport::new(800, 600));
        camera
    }

    #[test]
    fn fov_accepts_bounds_and_rejects_outside() {
        let mut camera = camera();
        assert!(camera.set_field_of_view(5.0));
        assert!(camera.set_field_of_view(100.0));
        assert!(!camera.set_field_of_view(4.99));
        assert!(!camera.set_field_of_view(100.5));
        assert!(!camera.set_field_of_view(f32::NAN));
        assert_eq!(camera.field_of_view(), 100.0);
    }

    #[test]
    fn frustum_matches_fov_formula() {
        let camera = camera();
        let half = 0.1 * (30.0f32 / 180.0).tan();
        assert!((camera.frustum_half_extent() - half).abs() < 1e-7);

        let expected = frustum(-half, half, -half * 0.75, half * 0.75, 0.1, 20.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn model_matrix_translates_then_rotates() {
        let mut camera = camera();
        camera.rotate_drag(Vec2::new(360.0, 0.0), 1.0);
        let m = camera.model_matrix();
        // 90° about Y carries +X to -Z, then the planet translation applies.
        let p = m * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert!(p.abs_diff_eq(Vec4::new(0.0, 0.0, -11.0, 1.0), 1e-5), "{p:?}");
    }

    #[test]
    fn drag_divides_by_density_and_damping() {
        let mut a = camera();
        let mut b = camera();
        a.rotate_drag(Vec2::new(40.0, -20.0), 2.0);
        b.rotate_drag(Vec2::new(20.0, -10.0), 1.0);
        assert!(a.rotation().abs_diff_eq(b.rotation(), 1e-6));
    }

    #[test]
    fn drag_increments_apply_in_eye_space() {
        let mut camera = camera();
        camera.rotate_drag(Vec2::new(0.0, 360.0), 1.0);
        camera.rotate_drag(Vec2::new(360.0, 0.0), 1.0);
        let expected = Mat4::from_rotation_y(90f32.to_radians()) * Mat4::from_rotation_x(90f32.to_radians());
        assert!(camera.rotation().abs_diff_eq(expected, 1e-5));
    }

    fn bits(m: Mat4) -> [u32; 16] {
        m.to_cols_array().map(f32::to_bits)
    }

    #[test]
    fn zero_drag_keeps_rotation() {
        let mut camera = camera();
        camera.rotate_drag(Vec2::new(37.0, -53.0), 1.0);
        camera.rotate_twist(12.5, 1.0);
        let before = bits(camera.rotation());

        for _ in 0..10 {
            camera.rotate_drag(Vec2::ZERO, 1.0);
        }
        assert_eq!(bits(camera.rotation()), before);

        for _ in 0..10 {
            camera.rotate_twist(0.0, 1.0);
        }
        assert_eq!(bits(camera.rotation()), before);
    }

    #[test]
    fn twist_rotates_about_view_axis() {
        let mut camera = camera();
        camera.rotate_twist(180.0, 2.0);
        let p = camera.rotation() * Vec4::new(1.0, 0.0, 0.0, 0.0);
        assert!(p.abs_diff_eq(Vec4::new(0.0, 1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn globe_scale_shrinks_as_fov_widens() {
        let mut camera = camera();
        let narrow = camera.globe_scale();
        assert!(camera.set_field_of_view(60.0));
        assert!(camera.globe_scale() < narrow);
        assert!((narrow - 0.1 / (30.0f32 / 180.0).tan()).abs() < 1e-5);
    }
}
