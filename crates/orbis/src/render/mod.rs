//! # Render — What the Engine Hands to a GPU Backend
//!
//! The engine never talks to a graphics API. Each frame it composes a
//! [`Frame`]: the matrices, the globe mesh and texture, and flat lists of
//! billboards and glyph quads already placed in window pixels. A
//! [`RenderBackend`] turns that into draw calls.
//!
//! ```text
//!  GlobeEngine ──create_surface──▶ backend.prepare(&SurfaceSetup)     once
//!              ──render_frame───▶ backend.swap_globe_texture(handle)  if pending
//!                               ▶ backend.submit(&Frame)              every frame
//! ```
//!
//! ## Draw Order
//!
//! A backend must draw, in order:
//!
//! 1. Clear color and depth.
//! 2. The globe: one triangle strip of [`GlobeDraw::vertex_count`] vertices,
//!    depth-tested, back faces culled (counter-clockwise is front), lit with
//!    the two-light model from [`Lighting`] and modulated by the globe texture.
//! 3. Billboards, without depth testing, additively blended
//!    (`src + dst · (1 − src)`).
//! 4. Labels, without depth testing, alpha blended.
//!
//! Overlay geometry is in bottom-up window pixels (origin at the viewport's
//! lower-left corner).
//!
//! ## Backends
//!
//! - [`RecordingBackend`]: keeps a log of every call. Used by tests and for
//!   headless inspection.
//! - `WgpuBackend` (feature `wgpu`): renders with wgpu.

mod recording;

#[cfg(feature = "wgpu")]
pub mod gpu;

pub use recording::{BackendCall, FrameRecord, RecordingBackend};

use bytemuck::{Pod, Zeroable};

use crate::font::{FontHandle, GlyphAtlas, GlyphQuad};
use crate::math::{Color, Mat4, Vec2, Vec4, Viewport};
use crate::mesh::SphereMesh;
use crate::overlay::OverlayId;

/// Handle to a texture owned by a backend.
///
/// Backends mint these when they load an image; the engine only passes them
/// through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u32);

impl TextureHandle {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// A positional light, fixed-function style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    /// Position in eye space (w = 1) or direction (w = 0).
    pub position: Vec4,
    pub diffuse: Color,
    pub specular: Color,
}

/// Surface response of the globe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub shininess: f32,
}

/// The globe's lighting: two lights, a material, and a global ambient term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub lights: [Light; 2],
    pub material: Material,
    pub scene_ambient: Color,
}

impl Default for Lighting {
    /// A white key light and a white fill light with a sky-blue highlight,
    /// both at eye-space (1, 1, 1).
    fn default() -> Self {
        let white_diffuse = Color::WHITE.with_alpha(0.8);
        Self {
            lights: [
                Light {
                    position: Vec4::ONE,
                    diffuse: white_diffuse,
                    specular: Color::BLACK,
                },
                Light {
                    position: Vec4::ONE,
                    diffuse: white_diffuse,
                    specular: Color::LIGHT_SKY_BLUE,
                },
            ],
            material: Material {
                ambient: Color::rgb(0.2, 0.2, 0.2),
                diffuse: Color::WHITE,
                specular: Color::WHITE,
                shininess: 25.0,
            },
            scene_ambient: Color::rgb(0.2, 0.2, 0.2),
        }
    }
}

/// GPU layout of one [`Light`].
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightUniform {
    pub position: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
}

/// GPU layout of [`Lighting`]. 16-byte aligned throughout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingUniform {
    pub lights: [LightUniform; 2],
    pub material_ambient: [f32; 4],
    pub material_diffuse: [f32; 4],
    pub material_specular: [f32; 4],
    pub scene_ambient: [f32; 4],
    pub shininess: f32,
    pub _padding: [f32; 3],
}

impl From<&Lighting> for LightingUniform {
    fn from(lighting: &Lighting) -> Self {
        let light = |l: &Light| LightUniform {
            position: l.position.to_array(),
            diffuse: l.diffuse.to_array(),
            specular: l.specular.to_array(),
        };
        Self {
            lights: [light(&lighting.lights[0]), light(&lighting.lights[1])],
            material_ambient: lighting.material.ambient.to_array(),
            material_diffuse: lighting.material.diffuse.to_array(),
            material_specular: lighting.material.specular.to_array(),
            scene_ambient: lighting.scene_ambient.to_array(),
            shininess: lighting.material.shininess,
            _padding: [0.0; 3],
        }
    }
}

/// One-time state handed to [`RenderBackend::prepare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSetup {
    pub clear_color: Color,
    pub lighting: Lighting,
}

/// The globe draw for one frame.
#[derive(Debug, Clone, Copy)]
pub struct GlobeDraw<'a> {
    pub mesh: &'a SphereMesh,
    /// `None` draws the globe untextured (white).
    pub texture: Option<TextureHandle>,
    pub vertex_count: usize,
}

/// A screen-aligned dot marking an overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    pub overlay: OverlayId,
    /// Center in bottom-up window pixels.
    pub center: Vec2,
    /// Full width and height in pixels.
    pub size: Vec2,
    /// Projected clip-space w of the anchor.
    pub depth: f32,
    pub color: Color,
    pub texture: Option<TextureHandle>,
}

/// An overlay label, laid out as glyph quads.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelDraw {
    pub overlay: OverlayId,
    pub font: FontHandle,
    pub color: Color,
    pub glyphs: Vec<GlyphQuad>,
}

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub clear_color: Color,
    pub viewport: Viewport,
    pub projection: Mat4,
    pub model: Mat4,
    pub globe: GlobeDraw<'a>,
    pub billboards: Vec<Billboard>,
    pub labels: Vec<LabelDraw>,
    /// All registered fonts, indexed by [`FontHandle::index`].
    pub fonts: &'a [GlyphAtlas],
}

impl Frame<'_> {
    /// Total glyph quads across all labels.
    pub fn glyph_count(&self) -> usize {
        self.labels.iter().map(|l| l.glyphs.len()).sum()
    }
}

/// A graphics API adapter driven by [`GlobeEngine`](crate::engine::GlobeEngine).
pub trait RenderBackend {
    /// Configure fixed state: clear color, lighting, pipelines.
    fn prepare(&mut self, setup: &SurfaceSetup);

    /// Make `texture` the globe's texture from the next submit on.
    fn swap_globe_texture(&mut self, texture: TextureHandle);

    /// Draw one frame.
    fn submit(&mut self, frame: &Frame<'_>);
}
