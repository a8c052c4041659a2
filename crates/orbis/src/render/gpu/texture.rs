//! # Texture Store — Handles to GPU Images
//!
//! Every texture the backend knows about lives in a [`TextureStore`] entry
//! together with its bind group. Callers hold a [`TextureHandle`], which is
//! just the entry index.
//!
//! ```text
//! TextureStore
//! ┌──────────────────────────────────────┐
//! │ entries: Vec<TextureEntry>           │
//! │   [0] 1x1 white (default)  ◄── always│
//! │   [1] "earth.jpg"                    │
//! │   [2] glyph atlas (font 0)           │
//! └──────────────────────────────────────┘
//! ```
//!
//! ## Row Order
//!
//! All texture data is uploaded bottom row first, so texture coordinate
//! `v = 0` is the bottom edge of the image. Glyph atlases are already decoded
//! that way; image files are flipped on load. The globe mesh runs `v` from the
//! south pole (0) to the north pole (1), so an ordinary equirectangular map
//! comes out north-up. The globe shader mirrors `u`, putting longitude 0 of
//! the map under the default texture offset at the front of the planet.
//!
//! An unknown handle resolves to the white default instead of panicking.

use std::path::Path;

use crate::error::GpuError;
use crate::render::TextureHandle;

use super::context::GpuContext;

/// Internal entry for a loaded GPU texture.
pub(crate) struct TextureEntry {
    pub bind_group: wgpu::BindGroup,
}

/// Stores all loaded GPU textures and their bind groups.
pub(crate) struct TextureStore {
    entries: Vec<TextureEntry>,
    pub layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl TextureStore {
    /// Create a new store with a 1x1 white default texture at index 0.
    pub fn new(gpu: &GpuContext) -> Self {
        let layout = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("texture layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        // The globe's u runs past 1.0 once a texture offset is applied.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut store = Self {
            entries: Vec::new(),
            layout,
            sampler,
        };
        store.insert_rgba8(gpu, "white 1x1", 1, 1, &[255, 255, 255, 255]);
        store
    }

    /// The default 1x1 white texture handle.
    pub fn default_handle(&self) -> TextureHandle {
        TextureHandle(0)
    }

    pub fn contains(&self, handle: TextureHandle) -> bool {
        (handle.0 as usize) < self.entries.len()
    }

    /// Get the entry for a handle, or the white default if it is unknown.
    pub fn get(&self, handle: TextureHandle) -> &TextureEntry {
        self.entries
            .get(handle.0 as usize)
            .unwrap_or(&self.entries[0])
    }

    /// Upload RGBA8 pixels (bottom row first) as a new texture.
    pub fn insert_rgba8(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> TextureHandle {
        use wgpu::util::DeviceExt;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            data,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        self.entries.push(TextureEntry { bind_group });
        TextureHandle((self.entries.len() - 1) as u32)
    }

    /// Decode an encoded image (PNG or JPEG) and upload it.
    pub fn insert_image(
        &mut self,
        gpu: &GpuContext,
        label: &str,
        image: image::DynamicImage,
    ) -> TextureHandle {
        let img = image.flipv().to_rgba8();
        let (width, height) = img.dimensions();
        let handle = self.insert_rgba8(gpu, label, width, height, img.as_raw());
        log::info!("loaded texture '{label}' ({width}x{height}) as {handle:?}");
        handle
    }

    /// Load an image file from disk.
    pub fn load(&mut self, gpu: &GpuContext, path: &Path) -> Result<TextureHandle, GpuError> {
        let image = image::open(path)?;
        Ok(self.insert_image(gpu, &path.display().to_string(), image))
    }
}
