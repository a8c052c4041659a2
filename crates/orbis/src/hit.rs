//! Overlay sizing and hit testing.
//!
//! Dots are sized relative to the globe's on-screen extent and shrink with
//! distance from the eye. The renderer and the hit tester share
//! [`dot_size`], so what you see is what you tap.

use crate::camera::Camera;
use crate::math::{Mat4, Vec2, Vec3};
use crate::projection::project;

/// Pixel width and height of the globe's silhouette.
///
/// Projects the planet center offset by ±`radius` along the view X and Y
/// axes. Rotation is excluded, since the silhouette of a sphere does not
/// depend on it.
pub fn globe_extent(camera: &Camera, radius: f32) -> Vec2 {
    let model = Mat4::from_translation(camera.planet_position());
    let proj = camera.projection_matrix();
    let viewport = camera.viewport();
    let at = |p: Vec3| project(p, &model, &proj, &viewport);

    let left = at(Vec3::new(-radius, 0.0, 0.0));
    let right = at(Vec3::new(radius, 0.0, 0.0));
    let bottom = at(Vec3::new(0.0, -radius, 0.0));
    let top = at(Vec3::new(0.0, radius, 0.0));

    Vec2::new((right.x - left.x).abs(), (top.y - bottom.y).abs())
}

/// How much an overlay at projected depth `w` is scaled.
///
/// Zero at `behind_depth`, growing linearly toward the eye.
pub fn depth_falloff(w: f32, behind_depth: f32) -> f32 {
    behind_depth - w
}

/// Full pixel size of an overlay dot.
pub fn dot_size(dot_scale: Vec2, globe_extent: Vec2, falloff: f32) -> Vec2 {
    dot_scale * globe_extent * falloff
}

/// Whether `point` hits a dot of `size` centered at `center`.
///
/// Both points must use the same Y convention.
pub fn dot_contains(center: Vec2, size: Vec2, point: Vec2) -> bool {
    let offset = (point - center).abs();
    let half = size / 2.0;
    offset.x + half.x < size.x && offset.y + half.y < size.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobeConfig;
    use crate::math::Viewport;

    #[test]
    fn extent_is_symmetric_about_the_center() {
        let mut camera = Camera::new(&GlobeConfig::default());
        camera.set_viewport(Viewport::new(600, 600));
        let extent = globe_extent(&camera, 1.0);
        assert!((extent.x - extent.y).abs() < 1e-2);
        assert!(extent.x > 0.0 && extent.x < 600.0);
    }

    #[test]
    fn extent_ignores_rotation() {
        let mut camera = Camera::new(&GlobeConfig::default());
        camera.set_viewport(Viewport::new(800, 600));
        let before = globe_extent(&camera, 1.0);
        camera.rotate_drag(Vec2::new(123.0, -45.0), 1.0);
        assert_eq!(globe_extent(&camera, 1.0), before);
    }

    #[test]
    fn extent_grows_as_fov_narrows() {
        let mut camera = Camera::new(&GlobeConfig::default());
        camera.set_viewport(Viewport::new(800, 600));
        let wide = globe_extent(&camera, 1.0);
        assert!(camera.set_field_of_view(10.0));
        assert!(globe_extent(&camera, 1.0).x > wide.x);
    }

    #[test]
    fn hit_box_is_half_the_dot_around_the_center() {
        let center = Vec2::new(100.0, 100.0);
        let size = Vec2::new(20.0, 10.0);
        assert!(dot_contains(center, size, center));
        assert!(dot_contains(center, size, Vec2::new(109.0, 104.0)));
        assert!(!dot_contains(center, size, Vec2::new(110.0, 100.0)));
        assert!(!dot_contains(center, size, Vec2::new(100.0, 95.0)));
        assert!(!dot_contains(center, Vec2::ZERO, center));
    }

    #[test]
    fn dots_shrink_with_depth() {
        let extent = Vec2::new(400.0, 400.0);
        let near = dot_size(Vec2::splat(0.1), extent, depth_falloff(9.0, 10.0));
        let far = dot_size(Vec2::splat(0.1), extent, depth_falloff(9.8, 10.0));
        assert!((near.x - 40.0).abs() < 1e-3);
        assert!(far.x < near.x);
    }
}
