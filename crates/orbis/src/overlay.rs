//! # Overlays — Markers Pinned to the Globe
//!
//! An [`Overlay`] is a point on (or above) the planet surface that gets a
//! screen-aligned dot and an optional text label. The anchor is given in the
//! planet's object space, so overlays turn with the globe. Dot and label sizes
//! shrink with distance from the eye, and overlays on the far side of the
//! planet are hidden.
//!
//! Use [`geodetic_to_cartesian`] to place an overlay by latitude and
//! longitude:
//!
//! ```
//! use orbis::overlay::{Overlay, geodetic_to_cartesian};
//!
//! let cairo = Overlay::new(geodetic_to_cartesian(30.04f32.to_radians(), 31.24f32.to_radians(), 1.0))
//!     .with_label("Cairo");
//! assert_eq!(cairo.label(), Some("Cairo"));
//! ```

use crate::font::FontHandle;
use crate::math::{Color, Vec2, Vec3};
use crate::render::TextureHandle;

/// Default dot size, as a fraction of the globe's on-screen extent.
pub const DEFAULT_DOT_SCALE: Vec2 = Vec2::new(0.1, 0.1);

/// Default label color, a light red.
pub const DEFAULT_LABEL_COLOR: Color = Color::rgba(1.0, 0.5, 0.5, 1.0);

/// Identifies an overlay by insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub(crate) usize);

impl OverlayId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A marker anchored to the globe.
///
/// The anchor and label are fixed once built. Colors, scales, the dot texture
/// and the font are styling and may change at any time through
/// [`GlobeEngine::overlay_mut`](crate::engine::GlobeEngine::overlay_mut).
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    anchor: Vec3,
    label: Option<String>,
    pub dot_color: Color,
    pub dot_scale: Vec2,
    pub dot_texture: Option<TextureHandle>,
    pub label_color: Color,
    pub label_scale: Vec2,
    pub font: Option<FontHandle>,
}

impl Overlay {
    /// An unlabeled white dot at `anchor`.
    pub fn new(anchor: Vec3) -> Self {
        Self {
            anchor,
            label: None,
            dot_color: Color::WHITE,
            dot_scale: DEFAULT_DOT_SCALE,
            dot_texture: None,
            label_color: DEFAULT_LABEL_COLOR,
            label_scale: Vec2::ONE,
            font: None,
        }
    }

    /// An overlay on a sphere of `radius` at the given latitude and longitude
    /// in degrees.
    pub fn geodetic(latitude_deg: f32, longitude_deg: f32, radius: f32) -> Self {
        Self::new(geodetic_to_cartesian(
            latitude_deg.to_radians(),
            longitude_deg.to_radians(),
            radius,
        ))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_font(mut self, font: FontHandle) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_dot_texture(mut self, texture: TextureHandle) -> Self {
        self.dot_texture = Some(texture);
        self
    }

    pub fn with_dot_color(mut self, color: Color) -> Self {
        self.dot_color = color;
        self
    }

    pub fn with_dot_scale(mut self, scale: Vec2) -> Self {
        self.dot_scale = scale;
        self
    }

    pub fn with_label_color(mut self, color: Color) -> Self {
        self.label_color = color;
        self
    }

    pub fn with_label_scale(mut self, scale: Vec2) -> Self {
        self.label_scale = scale;
        self
    }

    /// Anchor point in planet object space.
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The label, if there is one with visible characters.
    pub(crate) fn visible_label(&self) -> Option<&str> {
        self.label().filter(|l| !l.trim().is_empty())
    }
}

/// Convert latitude and longitude (radians) to a point on a sphere.
///
/// Latitude 0, longitude 0 faces the viewer (+Z). Latitude runs toward +Y
/// (north), and longitude turns east toward +X:
///
/// ```text
///   x =  r · sin(lon) · cos(lat)
///   y =  r · sin(lat)
///   z =  r · cos(lon) · cos(lat)
/// ```
pub fn geodetic_to_cartesian(latitude: f32, longitude: f32, radius: f32) -> Vec3 {
    let (sin_lat, cos_lat) = latitude.sin_cos();
    let (sin_lon, cos_lon) = longitude.sin_cos();
    Vec3::new(radius * sin_lon * cos_lat, radius * sin_lat, radius * cos_lon * cos_lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn defaults_match_marker_style() {
        let o = Overlay::new(Vec3::Z);
        assert_eq!(o.dot_color, Color::WHITE);
        assert_eq!(o.dot_scale, Vec2::new(0.1, 0.1));
        assert_eq!(o.label_color, Color::rgba(1.0, 0.5, 0.5, 1.0));
        assert_eq!(o.label_scale, Vec2::ONE);
        assert_eq!(o.label(), None);
        assert_eq!(o.font, None);
        assert_eq!(o.dot_texture, None);
    }

    #[test]
    fn builder_sets_styling() {
        let o = Overlay::new(Vec3::Y)
            .with_label("North")
            .with_font(FontHandle(2))
            .with_dot_texture(TextureHandle::new(7))
            .with_dot_color(Color::SKY_BLUE)
            .with_dot_scale(Vec2::splat(0.2))
            .with_label_color(Color::WHITE)
            .with_label_scale(Vec2::splat(0.5));
        assert_eq!(o.anchor(), Vec3::Y);
        assert_eq!(o.label(), Some("North"));
        assert_eq!(o.font, Some(FontHandle(2)));
        assert_eq!(o.dot_texture, Some(TextureHandle::new(7)));
        assert_eq!(o.dot_scale, Vec2::splat(0.2));
        assert_eq!(o.label_scale, Vec2::splat(0.5));
    }

    #[test]
    fn blank_labels_are_not_visible() {
        assert_eq!(Overlay::new(Vec3::Z).with_label("  \t").visible_label(), None);
        assert_eq!(Overlay::new(Vec3::Z).with_label("").visible_label(), None);
        assert_eq!(Overlay::new(Vec3::Z).with_label(" Rome ").visible_label(), Some(" Rome "));
    }

    #[test]
    fn geodetic_origin_faces_viewer() {
        let p = geodetic_to_cartesian(0.0, 0.0, 2.0);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, 2.0), 1e-6));
    }

    #[test]
    fn geodetic_cardinal_directions() {
        let north = geodetic_to_cartesian(FRAC_PI_2, 0.0, 1.0);
        assert!(north.abs_diff_eq(Vec3::Y, 1e-6));

        let east = geodetic_to_cartesian(0.0, FRAC_PI_2, 1.0);
        assert!(east.abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn geodetic_points_lie_on_the_sphere() {
        for (lat, lon) in [(-37.8f32, 144.9f32), (-33.9, 18.4), (30.0, 31.2), (40.7, -74.0)] {
            let p = geodetic_to_cartesian(lat.to_radians(), lon.to_radians(), 3.0);
            assert!((p.length() - 3.0).abs() < 1e-5);
        }
    }

    #[test]
    fn overlay_geodetic_takes_degrees() {
        let o = Overlay::geodetic(90.0, 0.0, 1.0);
        assert!(o.anchor().abs_diff_eq(Vec3::Y, 1e-6));
    }
}
