//! # Overlay Pass — Billboards and Label Glyphs
//!
//! Overlays are flat quads in window pixels. Each frame this module turns the
//! frame's billboards and glyph quads into one shared vertex and index buffer,
//! converts pixels to NDC on the CPU, and groups consecutive quads that share
//! a texture into a [`DrawBatch`].
//!
//! ```text
//!  billboards ──▶ quads ──┐                   ┌─ billboard batches (additive)
//!                         ├─▶ vertices/indices┤
//!  label glyphs ─▶ quads ─┘                   └─ glyph batches (alpha)
//! ```
//!
//! Billboards and glyphs use two pipelines that differ only in blending. Neither
//! reads or writes depth, so they always draw over the globe in submission
//! order.

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::font::{FontHandle, GlyphQuad};
use crate::math::{Color, Vec2};
use crate::render::{Billboard, Frame, TextureHandle};

use super::context::GpuContext;
use super::globe::DEPTH_FORMAT;
use super::texture::TextureStore;

/// A corner of an overlay quad, already in NDC.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub(crate) struct OverlayVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 8,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: 16,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// One draw call: a run of quads sharing a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrawBatch {
    pub texture: TextureHandle,
    pub index_start: u32,
    pub index_count: u32,
}

/// CPU-side overlay geometry for one frame.
#[derive(Debug, Default)]
pub(crate) struct OverlayGeometry {
    pub vertices: Vec<OverlayVertex>,
    pub indices: Vec<u32>,
    pub billboards: Vec<DrawBatch>,
    pub glyphs: Vec<DrawBatch>,
}

impl OverlayGeometry {
    /// Build quads for every billboard and glyph in `frame`.
    ///
    /// `font_texture` maps a font to the texture holding its atlas.
    pub fn build(
        frame: &Frame<'_>,
        default_texture: TextureHandle,
        font_texture: impl Fn(FontHandle) -> TextureHandle,
    ) -> Self {
        let screen = ScreenSpace::new(frame);
        let mut geometry = Self::default();

        for billboard in &frame.billboards {
            let texture = billboard.texture.unwrap_or(default_texture);
            let start = geometry.push_quad(billboard_quad(billboard, screen));
            push_batch(&mut geometry.billboards, texture, start);
        }

        for label in &frame.labels {
            let texture = font_texture(label.font);
            for glyph in &label.glyphs {
                let start = geometry.push_quad(glyph_quad(glyph, label.color, screen));
                push_batch(&mut geometry.glyphs, texture, start);
            }
        }

        geometry
    }

    fn push_quad(&mut self, corners: [OverlayVertex; 4]) -> u32 {
        let base = self.vertices.len() as u32;
        let start = self.indices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        start
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Extend the last batch if it uses `texture`, otherwise start a new one.
fn push_batch(batches: &mut Vec<DrawBatch>, texture: TextureHandle, index_start: u32) {
    match batches.last_mut() {
        Some(last) if last.texture == texture => last.index_count += 6,
        _ => batches.push(DrawBatch {
            texture,
            index_start,
            index_count: 6,
        }),
    }
}

/// Maps bottom-up window pixels inside the frame's viewport to NDC.
#[derive(Debug, Clone, Copy)]
struct ScreenSpace {
    origin: Vec2,
    size: Vec2,
}

impl ScreenSpace {
    fn new(frame: &Frame<'_>) -> Self {
        let viewport = frame.viewport;
        Self {
            origin: Vec2::new(viewport.x as f32, viewport.y as f32),
            size: Vec2::new(viewport.width.max(1) as f32, viewport.height.max(1) as f32),
        }
    }

    fn to_ndc(self, pixel: Vec2) -> [f32; 2] {
        ((pixel - self.origin) / self.size * 2.0 - Vec2::ONE).to_array()
    }
}

/// Corners in order bottom-left, bottom-right, top-right, top-left.
fn quad(
    min: Vec2,
    max: Vec2,
    uv_min: Vec2,
    uv_max: Vec2,
    color: Color,
    screen: ScreenSpace,
) -> [OverlayVertex; 4] {
    let color = color.to_array();
    let corner = |x: f32, y: f32, u: f32, v: f32| OverlayVertex {
        position: screen.to_ndc(Vec2::new(x, y)),
        uv: [u, v],
        color,
    };
    [
        corner(min.x, min.y, uv_min.x, uv_min.y),
        corner(max.x, min.y, uv_max.x, uv_min.y),
        corner(max.x, max.y, uv_max.x, uv_max.y),
        corner(min.x, max.y, uv_min.x, uv_max.y),
    ]
}

fn billboard_quad(billboard: &Billboard, screen: ScreenSpace) -> [OverlayVertex; 4] {
    let half = billboard.size * 0.5;
    quad(
        billboard.center - half,
        billboard.center + half,
        Vec2::ZERO,
        Vec2::ONE,
        billboard.color,
        screen,
    )
}

fn glyph_quad(glyph: &GlyphQuad, color: Color, screen: ScreenSpace) -> [OverlayVertex; 4] {
    let min = glyph.origin.truncate();
    quad(
        min,
        min + glyph.size,
        glyph.uv_min,
        glyph.uv_max,
        color,
        screen,
    )
}

// ── GPU side ────────────────────────────────────────────────────────────

/// Pipelines and the lazily uploaded font atlases for the overlay pass.
pub(crate) struct OverlayRenderer {
    billboard_pipeline: wgpu::RenderPipeline,
    glyph_pipeline: wgpu::RenderPipeline,
    font_textures: HashMap<usize, TextureHandle>,
}

/// `src + dst · (1 − src)` on every channel.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrc,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrc,
        operation: wgpu::BlendOperation::Add,
    },
};

impl OverlayRenderer {
    pub fn new(gpu: &GpuContext, textures: &TextureStore) -> Self {
        let device = &gpu.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("overlay.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay pipeline layout"),
            bind_group_layouts: &[&textures.layout],
            push_constant_ranges: &[],
        });

        let pipeline = |label: &str, blend: wgpu::BlendState| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    buffers: &[OverlayVertex::LAYOUT],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: gpu.surface_format(),
                        blend: Some(blend),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                // Shares the globe pass's depth attachment but ignores it.
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare: wgpu::CompareFunction::Always,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            })
        };

        Self {
            billboard_pipeline: pipeline("billboard pipeline", ADDITIVE),
            glyph_pipeline: pipeline("glyph pipeline", wgpu::BlendState::ALPHA_BLENDING),
            font_textures: HashMap::new(),
        }
    }

    /// Upload any font atlases in `frame` that are not on the GPU yet.
    pub fn sync_fonts(&mut self, gpu: &GpuContext, textures: &mut TextureStore, frame: &Frame<'_>) {
        for label in &frame.labels {
            let index = label.font.index();
            if self.font_textures.contains_key(&index) {
                continue;
            }
            let Some(atlas) = frame.fonts.get(index) else {
                log::warn!("label references unknown font {index}");
                continue;
            };
            let handle = textures.insert_rgba8(
                gpu,
                &format!("glyph atlas {index}"),
                atlas.width(),
                atlas.height(),
                &atlas.to_rgba8(),
            );
            log::debug!(
                "uploaded glyph atlas {index} ({}x{}) as {handle:?}",
                atlas.width(),
                atlas.height()
            );
            self.font_textures.insert(index, handle);
        }
    }

    pub fn font_texture(&self, font: FontHandle, fallback: TextureHandle) -> TextureHandle {
        self.font_textures
            .get(&font.index())
            .copied()
            .unwrap_or(fallback)
    }

    /// Upload this frame's geometry. `None` when there is nothing to draw.
    pub fn upload(
        &self,
        device: &wgpu::Device,
        geometry: &OverlayGeometry,
    ) -> Option<(wgpu::Buffer, wgpu::Buffer)> {
        if geometry.is_empty() {
            return None;
        }
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay vertex buffer"),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("overlay index buffer"),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Some((vertex_buffer, index_buffer))
    }

    /// Record billboards, then glyphs, into `pass`.
    pub fn draw(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        textures: &TextureStore,
        geometry: &OverlayGeometry,
        buffers: &(wgpu::Buffer, wgpu::Buffer),
    ) {
        let (vertex_buffer, index_buffer) = buffers;
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);

        let passes = [
            (&self.billboard_pipeline, &geometry.billboards),
            (&self.glyph_pipeline, &geometry.glyphs),
        ];
        for (pipeline, batches) in passes {
            if batches.is_empty() {
                continue;
            }
            pass.set_pipeline(pipeline);
            for batch in batches {
                pass.set_bind_group(0, &textures.get(batch.texture).bind_group, &[]);
                pass.draw_indexed(
                    batch.index_start..batch.index_start + batch.index_count,
                    0,
                    0..1,
                );
            }
        }
    }
}
