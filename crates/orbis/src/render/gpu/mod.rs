//! # wgpu Backend — Drawing Frames on a Window Surface
//!
//! [`WgpuBackend`] implements [`RenderBackend`] on top of a [`GpuContext`].
//! One frame is one render pass:
//!
//! ```text
//! get_current_texture ─▶ clear color + depth
//!                        ├─ globe strip       (depth test, cull back faces)
//!                        ├─ billboards        (additive, no depth)
//!                        └─ label glyphs      (alpha, no depth)
//!                     ─▶ submit ─▶ present
//! ```
//!
//! A lost or outdated surface is reconfigured and the frame is dropped; the
//! next frame draws normally. Other surface errors are logged.
//!
//! ## Comparison
//!
//! - **Raw GL (`GLSurfaceView.Renderer`)**: global state machine, the
//!   renderer re-issues matrix and light state per frame. Here pipelines bake
//!   the state once and only uniforms change.
//! - **Bevy**: extracts the scene into a render world and schedules passes in
//!   a render graph. Far more general; this backend has exactly one pass.

mod context;
mod globe;
mod overlay;
mod texture;

pub use context::GpuContext;
pub use globe::DEPTH_REMAP;

use std::path::Path;

use crate::error::GpuError;
use crate::math::Color;
use crate::render::{Frame, RenderBackend, SurfaceSetup, TextureHandle};

use globe::GlobeRenderer;
use overlay::{OverlayGeometry, OverlayRenderer};
use texture::TextureStore;

/// Renders [`Frame`]s with wgpu.
pub struct WgpuBackend {
    gpu: GpuContext,
    textures: TextureStore,
    globe: GlobeRenderer,
    overlays: OverlayRenderer,
    clear_color: Color,
    globe_texture: Option<TextureHandle>,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Self {
        let textures = TextureStore::new(&gpu);
        let globe = GlobeRenderer::new(&gpu, &textures);
        let overlays = OverlayRenderer::new(&gpu, &textures);
        Self {
            gpu,
            textures,
            globe,
            overlays,
            clear_color: Color::BLACK,
            globe_texture: None,
        }
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    /// Resize the surface and the depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let (w, h) = self.gpu.surface_size();
        self.globe.ensure_depth_size(&self.gpu.device, w, h);
    }

    /// Load a PNG or JPEG file as a texture.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureHandle, GpuError> {
        self.textures.load(&self.gpu, path.as_ref())
    }

    /// Decode an in-memory PNG or JPEG as a texture.
    pub fn load_texture_from_memory(
        &mut self,
        label: &str,
        bytes: &[u8],
    ) -> Result<TextureHandle, GpuError> {
        let image = image::load_from_memory(bytes)?;
        Ok(self.textures.insert_image(&self.gpu, label, image))
    }

    /// Upload raw RGBA8 pixels, bottom row first.
    pub fn insert_rgba8(&mut self, label: &str, width: u32, height: u32, data: &[u8]) -> TextureHandle {
        self.textures.insert_rgba8(&self.gpu, label, width, height, data)
    }

    fn draw(&mut self, frame: &Frame<'_>) -> Result<(), wgpu::SurfaceError> {
        let (width, height) = self.gpu.surface_size();
        self.globe.ensure_depth_size(&self.gpu.device, width, height);
        self.globe
            .set_transforms(&self.gpu.queue, frame.projection, frame.model);
        let globe_count = self
            .globe
            .sync_mesh(&self.gpu, frame.globe.mesh, frame.globe.vertex_count);

        self.overlays.sync_fonts(&self.gpu, &mut self.textures, frame);
        let default_texture = self.textures.default_handle();
        let overlays = &self.overlays;
        let geometry = OverlayGeometry::build(frame, default_texture, |font| {
            overlays.font_texture(font, default_texture)
        });
        let overlay_buffers = self.overlays.upload(&self.gpu.device, &geometry);

        let globe_texture = frame
            .globe
            .texture
            .or(self.globe_texture)
            .unwrap_or(default_texture);

        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("orbis frame encoder"),
            });

        {
            let c = self.clear_color;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("globe render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: c.r as f64,
                            g: c.g as f64,
                            b: c.b as f64,
                            a: c.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.globe.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let vp = frame.viewport;
            let top = height as i64 - (vp.y as i64 + vp.height as i64);
            if vp.x >= 0
                && top >= 0
                && vp.width > 0
                && vp.height > 0
                && vp.x as u32 + vp.width <= width
            {
                pass.set_viewport(
                    vp.x as f32,
                    top as f32,
                    vp.width as f32,
                    vp.height as f32,
                    0.0,
                    1.0,
                );
            }

            if let Some(count) = globe_count {
                let texture = &self.textures.get(globe_texture).bind_group;
                self.globe.draw(&mut pass, texture, count);
            }
            if let Some(buffers) = &overlay_buffers {
                self.overlays
                    .draw(&mut pass, &self.textures, &geometry, buffers);
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

impl RenderBackend for WgpuBackend {
    fn prepare(&mut self, setup: &SurfaceSetup) {
        self.clear_color = setup.clear_color;
        self.globe.set_lighting(&self.gpu.queue, &setup.lighting);
        log::debug!("surface prepared, clear color {:?}", setup.clear_color);
    }

    fn swap_globe_texture(&mut self, texture: TextureHandle) {
        if !self.textures.contains(texture) {
            log::warn!("unknown globe texture {texture:?}, drawing untextured");
        }
        self.globe_texture = Some(texture);
    }

    fn submit(&mut self, frame: &Frame<'_>) {
        match self.draw(frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("surface lost or outdated, reconfiguring");
                self.gpu.reconfigure();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => log::error!("out of GPU memory"),
            Err(e) => log::warn!("frame dropped: {e}"),
        }
    }
}
