//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. Matrices follow glam's column-major,
//! column-vector convention: `a * b` applies `b` first. [`Viewport`] and
//! [`Color`] are the small value types shared by the camera, the projection
//! helpers, and the render backends.

use serde::{Deserialize, Serialize};

pub use glam::{Mat4, Vec2, Vec3, Vec4};

/// A pixel rectangle in window space, origin at the bottom-left corner.
///
/// This is the same convention `glViewport` uses. Screen points coming from
/// touch or mouse input are top-down; see
/// [`screen_location`](crate::projection::screen_location) for the flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// A viewport covering `width × height` pixels starting at the origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    /// Width over height. A zero height is treated as one pixel.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Size in pixels as a float vector.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Center point in bottom-up window coordinates.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32) + self.size() * 0.5
    }
}

/// An RGBA color with f32 components in the range [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
    pub const SKY_BLUE: Self = Self::rgb(0.529, 0.808, 0.922);
    pub const LIGHT_SKY_BLUE: Self = Self::rgb(0.529, 0.808, 0.980);

    /// Create a color from RGB (alpha = 1.0).
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Create a color from RGBA.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Return a copy with a different alpha.
    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Convert to a `[f32; 4]` array for GPU upload.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Build an off-center perspective matrix with the semantics of `glFrustum`.
///
/// Clip-space depth lands in `[-1, 1]`. GPU APIs with a `[0, 1]` depth range
/// must remap it before rasterizing (the wgpu backend does).
pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let width = right - left;
    let height = top - bottom;
    let depth = far - near;
    Mat4::from_cols(
        Vec4::new(2.0 * near / width, 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 * near / height, 0.0, 0.0),
        Vec4::new(
            (right + left) / width,
            (top + bottom) / height,
            -(far + near) / depth,
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -2.0 * far * near / depth, 0.0),
    )
}
