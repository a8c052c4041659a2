//! # Mesh — The Globe as One Triangle Strip
//!
//! The planet is a latitude/longitude sphere emitted as a single
//! triangle strip. Each latitude band walks once around the Y axis, alternating a
//! vertex on the band's lower edge with one on its upper edge. Bands are
//! joined by two degenerate vertices, so the whole sphere is drawn in one call
//! without an index buffer.
//!
//! ```text
//!   φ1  u0──u1──u2── … ──u(n-1)
//!        │ ╲ │ ╲ │          │      strip: l0 u0 l1 u1 … l(n-1) u(n-1) J J
//!   φ0  l0──l1──l2── … ──l(n-1)     J = copy of u(n-1) (degenerate join)
//! ```
//!
//! A mesh with `stacks` bands and `slices` columns has exactly
//! `(slices * 2 + 2) * stacks` vertices. The last column sits at θ = 2π, on
//! top of the first, so the seam closes and the texture wraps once.
//!
//! ## Squash and Normals
//!
//! `squash` scales the vertical axis of positions only (an oblate planet).
//! Normals stay those of the unit sphere.
//!
//! ## Texture Offset
//!
//! Texture coordinates run `u = slice / (slices - 1) + offset.x` and
//! `v = band / stacks + offset.y`. Changing the offset rewrites the UV buffer
//! in place, leaving positions and normals alone. The sampler is expected to
//! repeat, since `u` exceeds 1.0 for any positive offset.
//!
//! ## Degenerate Inputs
//!
//! `slices < 2` makes the longitude step undefined (the values are NaN or
//! infinite) but never panics. `stacks == 0` yields an empty mesh.
//!
//! ## Comparison
//!
//! - **three.js**: `SphereGeometry` builds an indexed triangle list with the
//!   same equirectangular UVs.
//! - **GLU**: `gluSphere` emits one strip per stack; here the stacks are
//!   stitched into a single strip instead.

use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};

use crate::math::{Vec2, Vec3};

/// Number of vertices in a globe strip.
pub fn strip_vertex_count(stacks: u32, slices: u32) -> usize {
    (slices as usize * 2 + 2) * stacks as usize
}

/// An interleaved globe vertex, ready for GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlobeVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

/// Sphere geometry as separate position, normal, UV, and color buffers.
///
/// Positions and normals have 3 components per vertex, UVs 2, and colors 4.
/// All four buffers describe the same [`vertex_count`](Self::vertex_count)
/// vertices in strip order.
#[derive(Debug, Clone)]
pub struct SphereMesh {
    stacks: u32,
    slices: u32,
    radius: f32,
    squash: f32,
    texture_offset: Vec2,
    positions: Vec<f32>,
    normals: Vec<f32>,
    uvs: Vec<f32>,
    colors: Vec<f32>,
    uv_revision: u64,
}

impl SphereMesh {
    /// Generate a sphere with no texture offset.
    pub fn new(stacks: u32, slices: u32, radius: f32, squash: f32) -> Self {
        Self::with_texture_offset(stacks, slices, radius, squash, Vec2::ZERO)
    }

    /// Generate a sphere with UVs shifted by `offset`.
    pub fn with_texture_offset(
        stacks: u32,
        slices: u32,
        radius: f32,
        squash: f32,
        offset: Vec2,
    ) -> Self {
        let count = strip_vertex_count(stacks, slices);
        let mut positions = vec![0.0; count * 3];
        let mut normals = vec![0.0; count * 3];
        let mut uvs = vec![0.0; count * 2];
        let colors = vec![1.0; count * 4];

        let band_step = 1.0 / stacks as f32;
        let slice_step = 1.0 / (slices as f32 - 1.0);

        let mut v = 0;
        for band in 0..stacks {
            let phi0 = PI * (band as f32 * band_step - 0.5);
            let phi1 = PI * ((band + 1) as f32 * band_step - 0.5);
            let (sin0, cos0) = phi0.sin_cos();
            let (sin1, cos1) = phi1.sin_cos();

            for slice in 0..slices {
                let theta = TAU * slice as f32 * slice_step;
                let (sin_t, cos_t) = theta.sin_cos();

                let lower = Vec3::new(cos0 * cos_t, sin0, cos0 * sin_t);
                let upper = Vec3::new(cos1 * cos_t, sin1, cos1 * sin_t);

                write3(&mut positions, v, surface_point(lower, radius, squash));
                write3(&mut normals, v, lower);
                write3(&mut positions, v + 1, surface_point(upper, radius, squash));
                write3(&mut normals, v + 1, upper);
                v += 2;
            }

            // Degenerate join: repeat the band's last vertex twice.
            if v > 0 {
                repeat3(&mut positions, v - 1, v);
                repeat3(&mut normals, v - 1, v);
            }
            v += 2;
        }

        fill_uvs(&mut uvs, stacks, slices, offset);

        Self {
            stacks,
            slices,
            radius,
            squash,
            texture_offset: offset,
            positions,
            normals,
            uvs,
            colors,
            uv_revision: 0,
        }
    }

    pub fn stacks(&self) -> u32 {
        self.stacks
    }

    pub fn slices(&self) -> u32 {
        self.slices
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn squash(&self) -> f32 {
        self.squash
    }

    /// Number of vertices in the strip.
    pub fn vertex_count(&self) -> usize {
        strip_vertex_count(self.stacks, self.slices)
    }

    /// Flat xyz positions.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Flat xyz unit normals.
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    /// Flat uv texture coordinates.
    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    /// Flat rgba colors, all white.
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn texture_offset(&self) -> Vec2 {
        self.texture_offset
    }

    /// Counter bumped on every UV rewrite, so backends know when to re-upload.
    pub fn uv_revision(&self) -> u64 {
        self.uv_revision
    }

    /// Shift the texture by `offset`, rewriting only the UV buffer.
    pub fn set_texture_offset(&mut self, offset: Vec2) {
        self.texture_offset = offset;
        fill_uvs(&mut self.uvs, self.stacks, self.slices, offset);
        self.uv_revision += 1;
    }

    /// Position of vertex `index`.
    pub fn position(&self, index: usize) -> Vec3 {
        Vec3::from_slice(&self.positions[index * 3..index * 3 + 3])
    }

    /// Texture coordinate of vertex `index`.
    pub fn uv(&self, index: usize) -> Vec2 {
        Vec2::from_slice(&self.uvs[index * 2..index * 2 + 2])
    }

    /// Pack the four buffers into interleaved vertices.
    pub fn interleaved(&self) -> Vec<GlobeVertex> {
        (0..self.vertex_count())
            .map(|i| GlobeVertex {
                position: [
                    self.positions[i * 3],
                    self.positions[i * 3 + 1],
                    self.positions[i * 3 + 2],
                ],
                normal: [
                    self.normals[i * 3],
                    self.normals[i * 3 + 1],
                    self.normals[i * 3 + 2],
                ],
                uv: [self.uvs[i * 2], self.uvs[i * 2 + 1]],
                color: [
                    self.colors[i * 4],
                    self.colors[i * 4 + 1],
                    self.colors[i * 4 + 2],
                    self.colors[i * 4 + 3],
                ],
            })
            .collect()
    }
}

fn surface_point(direction: Vec3, radius: f32, squash: f32) -> Vec3 {
    Vec3::new(
        radius * direction.x,
        radius * direction.y * squash,
        radius * direction.z,
    )
}

fn write3(buffer: &mut [f32], vertex: usize, value: Vec3) {
    buffer[vertex * 3..vertex * 3 + 3].copy_from_slice(&value.to_array());
}

/// Copy vertex `from` into the two slots starting at `to`.
fn repeat3(buffer: &mut [f32], from: usize, to: usize) {
    buffer.copy_within(from * 3..from * 3 + 3, to * 3);
    buffer.copy_within(from * 3..from * 3 + 3, (to + 1) * 3);
}

fn fill_uvs(uvs: &mut [f32], stacks: u32, slices: u32, offset: Vec2) {
    let band_step = 1.0 / stacks as f32;
    let slice_step = 1.0 / (slices as f32 - 1.0);

    let mut v = 0;
    for band in 0..stacks {
        let v0 = band as f32 * band_step + offset.y;
        let v1 = (band + 1) as f32 * band_step + offset.y;

        for slice in 0..slices {
            let u = slice as f32 * slice_step + offset.x;
            uvs[v * 2..v * 2 + 4].copy_from_slice(&[u, v0, u, v1]);
            v += 2;
        }

        if v > 0 {
            uvs.copy_within((v - 1) * 2..v * 2, v * 2);
            uvs.copy_within((v - 1) * 2..v * 2, (v + 1) * 2);
        }
        v += 2;
    }
}
