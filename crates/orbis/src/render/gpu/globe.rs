//! # Globe Pipeline — Lit, Textured Triangle Strip
//!
//! The globe is one non-indexed triangle strip (see [`crate::mesh`]), drawn
//! with depth testing and back-face culling. Two bind groups:
//!
//! - **Group 0**: the per-frame transform uniform plus the lighting uniform,
//!   which only changes in [`RenderBackend::prepare`](crate::render::RenderBackend::prepare).
//! - **Group 1**: the globe texture from the [`TextureStore`].
//!
//! ## Depth Range
//!
//! The engine's projection matrix uses `glFrustum` conventions, with clip
//! depth in `[-1, 1]`. wgpu clips depth to `[0, 1]`, so the pipeline
//! premultiplies [`DEPTH_REMAP`], `z' = (z + w) / 2`.
//!
//! ## Lighting
//!
//! Lighting is computed per fragment in eye space with the fixed-function
//! model: a scene ambient term, then per light a Lambert diffuse term and a
//! Blinn-Phong specular term with the viewer at infinity. The lit color
//! modulates the texture.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::math::Mat4;
use crate::mesh::{GlobeVertex, SphereMesh};
use crate::render::{Lighting, LightingUniform};

use super::context::GpuContext;
use super::texture::TextureStore;

/// Depth texture format used by the globe pass.
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Maps `[-1, 1]` clip depth to wgpu's `[0, 1]`.
#[rustfmt::skip]
pub const DEPTH_REMAP: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

impl GlobeVertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<GlobeVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position: vec3<f32>
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal: vec3<f32>
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv: vec2<f32>
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color: vec4<f32>
            wgpu::VertexAttribute {
                offset: 32,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x4,
            },
        ],
    };
}

/// Per-frame transforms for the globe shader.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub(crate) struct GlobeUniform {
    pub clip_from_object: [[f32; 4]; 4],
    pub eye_from_object: [[f32; 4]; 4],
}

impl GlobeUniform {
    pub fn new(projection: Mat4, model: Mat4) -> Self {
        Self {
            clip_from_object: (DEPTH_REMAP * projection * model).to_cols_array_2d(),
            eye_from_object: model.to_cols_array_2d(),
        }
    }
}

/// The uploaded strip and what it was built from.
struct MeshBuffer {
    buffer: wgpu::Buffer,
    vertex_count: u32,
    uv_revision: u64,
}

/// GPU resources for drawing the globe.
pub(crate) struct GlobeRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    pub depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
    mesh: Option<MeshBuffer>,
}

impl GlobeRenderer {
    pub fn new(gpu: &GpuContext, textures: &TextureStore) -> Self {
        let device = &gpu.device;

        // ── Shader ──────────────────────────────────────────────────────
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("globe shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("globe.wgsl").into()),
        });

        // ── Bind group layout 0: transforms + lighting ──────────────────
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globe uniform layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        // ── Pipeline ────────────────────────────────────────────────────
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("globe pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &textures.layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("globe pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[GlobeVertex::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Buffers + bind group ────────────────────────────────────────
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globe uniform buffer"),
            contents: bytemuck::cast_slice(&[GlobeUniform::new(Mat4::IDENTITY, Mat4::IDENTITY)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let lighting_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globe lighting buffer"),
            contents: bytemuck::cast_slice(&[LightingUniform::from(&Lighting::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globe uniform bind group"),
            layout: &uniform_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lighting_buffer.as_entire_binding(),
                },
            ],
        });

        let (w, h) = gpu.surface_size();

        Self {
            pipeline,
            uniform_buffer,
            lighting_buffer,
            uniform_bind_group,
            depth_view: create_depth_texture(device, w, h),
            depth_size: (w, h),
            mesh: None,
        }
    }

    pub fn set_lighting(&self, queue: &wgpu::Queue, lighting: &Lighting) {
        queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::cast_slice(&[LightingUniform::from(lighting)]),
        );
    }

    pub fn set_transforms(&self, queue: &wgpu::Queue, projection: Mat4, model: Mat4) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[GlobeUniform::new(projection, model)]),
        );
    }

    /// Recreate the depth texture if the surface size changed.
    pub fn ensure_depth_size(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.depth_size != (width, height) {
            self.depth_view = create_depth_texture(device, width, height);
            self.depth_size = (width, height);
        }
    }

    /// Upload the mesh if it is new or its UVs changed. Returns the number
    /// of vertices to draw, or `None` when there is nothing to draw.
    pub fn sync_mesh(&mut self, gpu: &GpuContext, mesh: &SphereMesh, vertex_count: usize) -> Option<u32> {
        let count = vertex_count.min(mesh.vertex_count()) as u32;
        if count == 0 {
            return None;
        }

        let total = mesh.vertex_count() as u32;
        let reusable = matches!(&self.mesh, Some(m) if m.vertex_count == total);

        if reusable {
            if let Some(m) = self.mesh.as_mut().filter(|m| m.uv_revision != mesh.uv_revision()) {
                gpu.queue
                    .write_buffer(&m.buffer, 0, bytemuck::cast_slice(&mesh.interleaved()));
                m.uv_revision = mesh.uv_revision();
            }
        } else {
            let buffer = gpu
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("globe vertex buffer"),
                    contents: bytemuck::cast_slice(&mesh.interleaved()),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
            log::debug!("uploaded globe strip: {total} vertices");
            self.mesh = Some(MeshBuffer {
                buffer,
                vertex_count: total,
                uv_revision: mesh.uv_revision(),
            });
        }

        Some(count)
    }

    /// Record the globe draw into `pass`.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>, texture: &wgpu::BindGroup, count: u32) {
        let Some(mesh) = &self.mesh else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, texture, &[]);
        pass.set_vertex_buffer(0, mesh.buffer.slice(..));
        pass.draw(0..count, 0..1);
    }
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("globe depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
