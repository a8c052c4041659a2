//! # Engine — The Globe's Render State Machine
//!
//! [`GlobeEngine`] owns everything that describes the scene: the camera,
//! the sphere mesh, the overlays, and the registered fonts. A host drives it
//! through a small lifecycle:
//!
//! ```text
//!   GlobeEngine::new(config)
//!        │
//!        ▼  create_surface(backend)     lighting + clear color → backend
//!   ┌─────────┐
//!   │ Created │
//!   └────┬────┘
//!        ▼  update_surface(w, h)        viewport (again on every resize)
//!   ┌─────────┐
//!   │  Sized  │◀── render_frame(backend) each frame
//!   └─────────┘
//! ```
//!
//! Input handlers call [`rotate_drag`](GlobeEngine::rotate_drag),
//! [`rotate_twist`](GlobeEngine::rotate_twist) and
//! [`set_field_of_view`](GlobeEngine::set_field_of_view) between frames;
//! the next frame picks the changes up.
//!
//! ## Texture Swaps
//!
//! [`update_texture`](GlobeEngine::update_texture) only queues the new
//! texture. It is handed to the backend at the start of the next
//! [`render_frame`](GlobeEngine::render_frame), exactly once, before that
//! frame is submitted. When several arrive between frames, the last one wins.
//!
//! ## Overlays
//!
//! Each frame, every overlay anchor is projected through the current model
//! and projection matrices. The projected clip-space w measures distance from
//! the eye. Anchors farther than `behind_planet_depth` (the planet center's
//! distance, by default) are on the far hemisphere and are skipped. The rest
//! are scaled by `behind_planet_depth - w`, so markers grow as they rotate
//! toward the viewer.

use std::io::Read;

use crate::camera::Camera;
use crate::config::GlobeConfig;
use crate::error::{ConfigError, EngineError, FontError};
use crate::font::{FontHandle, GlyphAtlas, TextStyle};
use crate::hit::{depth_falloff, dot_contains, dot_size, globe_extent};
use crate::math::{Mat4, Vec2, Vec3, Viewport};
use crate::mesh::SphereMesh;
use crate::overlay::{Overlay, OverlayId, geodetic_to_cartesian};
use crate::projection::project;
use crate::render::{
    Billboard, Frame, GlobeDraw, LabelDraw, Lighting, RenderBackend, SurfaceSetup, TextureHandle,
};

#[cfg(feature = "diagnostics")]
use crate::diag::FrameStats;

/// Depth at which labels are drawn.
pub const LABEL_DEPTH: f32 = -10.0;

/// Where the engine is in its surface lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfacePhase {
    /// `create_surface` has not been called.
    Uncreated,
    /// Created, but no viewport size yet.
    Created,
    /// Ready to render.
    Sized,
}

/// The planet: its mesh, overlays, and current texture.
#[derive(Debug, Clone)]
struct Planet {
    mesh: SphereMesh,
    overlays: Vec<Overlay>,
    texture: Option<TextureHandle>,
}

/// An overlay's projected position for the current frame.
struct Placement {
    /// Bottom-up window pixels.
    center: Vec2,
    w: f32,
    falloff: f32,
}

/// Owns the globe scene and composes frames for a [`RenderBackend`].
#[derive(Debug, Clone)]
pub struct GlobeEngine {
    config: GlobeConfig,
    camera: Camera,
    planet: Planet,
    fonts: Vec<GlyphAtlas>,
    created: bool,
    sized: bool,
    pending_texture: Option<TextureHandle>,
    frames_rendered: u64,
    #[cfg(feature = "diagnostics")]
    stats: FrameStats,
}

impl Default for GlobeEngine {
    fn default() -> Self {
        Self::from_valid_config(GlobeConfig::default())
    }
}

impl GlobeEngine {
    /// Build an engine, generating the sphere mesh up front.
    pub fn new(config: GlobeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: GlobeConfig) -> Self {
        let mesh = SphereMesh::with_texture_offset(
            config.stacks,
            config.slices,
            config.radius,
            config.squash,
            config.texture_offset,
        );
        log::debug!(
            "generated globe mesh: {} stacks x {} slices, {} vertices",
            config.stacks,
            config.slices,
            mesh.vertex_count()
        );
        Self {
            camera: Camera::new(&config),
            planet: Planet {
                mesh,
                overlays: Vec::new(),
                texture: None,
            },
            fonts: Vec::new(),
            created: false,
            sized: false,
            pending_texture: None,
            frames_rendered: 0,
            #[cfg(feature = "diagnostics")]
            stats: FrameStats::default(),
            config,
        }
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Configure the backend's fixed state and reset the field of view.
    ///
    /// Calling this again (after a lost graphics context, say) re-prepares
    /// the backend and re-sends the current globe texture on the next frame.
    pub fn create_surface(&mut self, backend: &mut impl RenderBackend) {
        if self.created {
            log::warn!("render surface created again; re-preparing backend");
            if self.pending_texture.is_none() {
                self.pending_texture = self.planet.texture;
            }
        }

        backend.prepare(&SurfaceSetup {
            clear_color: self.config.clear_color,
            lighting: Lighting::default(),
        });
        self.camera.reset_field_of_view(self.config.default_fov);
        self.created = true;
        self.frames_rendered = 0;
        log::info!("render surface created");
    }

    /// Record the drawable size in pixels.
    pub fn update_surface(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(Viewport::new(width, height));
        self.sized = true;
        log::info!("render surface resized to {width}x{height}");
    }

    pub fn phase(&self) -> SurfacePhase {
        match (self.created, self.sized) {
            (false, _) => SurfacePhase::Uncreated,
            (true, false) => SurfacePhase::Created,
            (true, true) => SurfacePhase::Sized,
        }
    }

    fn ensure_ready(&self) -> Result<(), EngineError> {
        match self.phase() {
            SurfacePhase::Uncreated => Err(EngineError::SurfaceNotCreated),
            SurfacePhase::Created => Err(EngineError::SurfaceNotSized),
            SurfacePhase::Sized => Ok(()),
        }
    }

    /// Apply any pending texture, then compose and submit one frame.
    pub fn render_frame(&mut self, backend: &mut impl RenderBackend) -> Result<(), EngineError> {
        #[cfg(feature = "diagnostics")]
        let started = std::time::Instant::now();

        self.ensure_ready()?;

        let swapped = match self.pending_texture.take() {
            Some(texture) => {
                self.planet.texture = Some(texture);
                backend.swap_globe_texture(texture);
                log::info!("globe texture swapped to {texture:?}");
                true
            }
            None => false,
        };

        let frame = self.compose_frame()?;
        backend.submit(&frame);

        #[cfg(feature = "diagnostics")]
        let stats = FrameStats {
            frame: self.frames_rendered + 1,
            frame_time_ms: started.elapsed().as_secs_f32() * 1000.0,
            mesh_vertices: frame.globe.vertex_count,
            overlays_drawn: frame.billboards.len(),
            overlays_culled: self.planet.overlays.len() - frame.billboards.len(),
            labels_drawn: frame.labels.len(),
            glyph_quads: frame.glyph_count(),
            texture_swapped: swapped,
            field_of_view: self.camera.field_of_view(),
        };
        #[cfg(not(feature = "diagnostics"))]
        let _ = swapped;
        drop(frame);

        self.frames_rendered += 1;
        #[cfg(feature = "diagnostics")]
        {
            self.stats = stats;
        }
        Ok(())
    }

    /// Compose the current frame without submitting it or applying a
    /// pending texture.
    pub fn compose_frame(&self) -> Result<Frame<'_>, EngineError> {
        self.ensure_ready()?;

        let model = self.camera.model_matrix();
        let projection = self.camera.projection_matrix();
        let viewport = self.camera.viewport();
        let extent = self.globe_extent();
        let globe_scale = self.camera.globe_scale();

        let mut billboards = Vec::with_capacity(self.planet.overlays.len());
        let mut labels = Vec::new();

        for (index, overlay) in self.planet.overlays.iter().enumerate() {
            let id = OverlayId(index);
            let Some(placed) = self.place(overlay, &model, &projection, &viewport) else {
                continue;
            };

            billboards.push(Billboard {
                overlay: id,
                center: placed.center,
                size: dot_size(overlay.dot_scale, extent, placed.falloff),
                depth: placed.w,
                color: overlay.dot_color,
                texture: overlay.dot_texture,
            });

            let (Some(font), Some(text)) = (overlay.font, overlay.visible_label()) else {
                continue;
            };
            let Some(atlas) = self.fonts.get(font.index()) else {
                log::debug!("overlay {index} refers to unknown font {font:?}");
                continue;
            };

            let style = TextStyle::new(
                overlay.label_scale * globe_scale * placed.falloff,
                overlay.label_color,
            );
            let width = atlas.measure_px(text, &style) as f32;
            let x = placed.center.x - width / 2.0;
            let y = placed.center.y + atlas.line_height(&style) / 2.0;

            labels.push(LabelDraw {
                overlay: id,
                font,
                color: overlay.label_color,
                glyphs: atlas.layout(text, x, y, LABEL_DEPTH, &style),
            });
        }

        Ok(Frame {
            clear_color: self.config.clear_color,
            viewport,
            projection,
            model,
            globe: GlobeDraw {
                mesh: &self.planet.mesh,
                texture: self.planet.texture,
                vertex_count: self.planet.mesh.vertex_count(),
            },
            billboards,
            labels,
            fonts: &self.fonts,
        })
    }

    fn place(
        &self,
        overlay: &Overlay,
        model: &Mat4,
        projection: &Mat4,
        viewport: &Viewport,
    ) -> Option<Placement> {
        let p = project(overlay.anchor(), model, projection, viewport);
        let behind = self.config.behind_planet_depth;
        if p.z > behind {
            return None;
        }
        Some(Placement {
            center: p.truncate(),
            w: p.z,
            falloff: depth_falloff(p.z, behind),
        })
    }

    // ── Camera ──────────────────────────────────────────────────────────

    /// Turn the globe by a drag of `distance` pixels on a display with
    /// `density` pixels per point.
    pub fn rotate_drag(&mut self, distance: Vec2, density: f32) {
        self.camera.rotate_drag(distance, density);
    }

    /// Turn the globe about the view axis by `angle / density` degrees.
    pub fn rotate_twist(&mut self, angle: f32, density: f32) {
        self.camera.rotate_twist(angle, density);
    }

    /// Set the field of view. Out-of-range values are ignored and return
    /// `false`.
    pub fn set_field_of_view(&mut self, fov: f32) -> bool {
        let accepted = self.camera.set_field_of_view(fov);
        if !accepted {
            log::debug!("field of view {fov} rejected");
        }
        accepted
    }

    pub fn field_of_view(&self) -> f32 {
        self.camera.field_of_view()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn model_matrix(&self) -> Mat4 {
        self.camera.model_matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.camera.projection_matrix()
    }

    pub fn viewport(&self) -> Viewport {
        self.camera.viewport()
    }

    /// Pixel width and height of the globe on screen.
    pub fn globe_extent(&self) -> Vec2 {
        globe_extent(&self.camera, self.config.radius)
    }

    // ── Planet ──────────────────────────────────────────────────────────

    /// Queue a globe texture for the next frame.
    pub fn update_texture(&mut self, texture: TextureHandle) {
        self.pending_texture = Some(texture);
    }

    /// The texture that will be applied at the next frame, if any.
    pub fn pending_texture(&self) -> Option<TextureHandle> {
        self.pending_texture
    }

    /// The texture the globe is currently drawn with.
    pub fn globe_texture(&self) -> Option<TextureHandle> {
        self.planet.texture
    }

    /// Shift the globe texture horizontally and/or vertically.
    pub fn set_texture_offset(&mut self, offset: Vec2) {
        self.planet.mesh.set_texture_offset(offset);
    }

    pub fn mesh(&self) -> &SphereMesh {
        &self.planet.mesh
    }

    pub fn config(&self) -> &GlobeConfig {
        &self.config
    }

    /// A point on the planet surface at the given latitude and longitude in
    /// degrees.
    pub fn surface_point(&self, latitude_deg: f32, longitude_deg: f32) -> Vec3 {
        geodetic_to_cartesian(
            latitude_deg.to_radians(),
            longitude_deg.to_radians(),
            self.config.radius,
        )
    }

    // ── Overlays ────────────────────────────────────────────────────────

    pub fn add_overlay(&mut self, overlay: Overlay) -> OverlayId {
        self.planet.overlays.push(overlay);
        OverlayId(self.planet.overlays.len() - 1)
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.planet.overlays.get(id.0)
    }

    /// Mutable access for styling changes.
    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.planet.overlays.get_mut(id.0)
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.planet.overlays
    }

    /// The first overlay whose dot contains `point` (top-down screen pixels).
    ///
    /// Overlays are checked in insertion order; hidden ones are skipped.
    pub fn overlay_at(&self, point: Vec2) -> Option<OverlayId> {
        if self.phase() != SurfacePhase::Sized {
            return None;
        }

        let model = self.camera.model_matrix();
        let projection = self.camera.projection_matrix();
        let viewport = self.camera.viewport();
        let extent = self.globe_extent();

        self.planet
            .overlays
            .iter()
            .enumerate()
            .find_map(|(index, overlay)| {
                let placed = self.place(overlay, &model, &projection, &viewport)?;
                let center = Vec2::new(placed.center.x, viewport.height as f32 - placed.center.y);
                let size = dot_size(overlay.dot_scale, extent, placed.falloff);
                dot_contains(center, size, point).then_some(OverlayId(index))
            })
    }

    // ── Fonts ───────────────────────────────────────────────────────────

    /// Register a decoded glyph atlas for overlay labels.
    pub fn add_font(&mut self, atlas: GlyphAtlas) -> FontHandle {
        self.fonts.push(atlas);
        FontHandle(self.fonts.len() - 1)
    }

    /// Decode a BFF2 font and register it.
    pub fn load_font(&mut self, reader: impl Read) -> Result<FontHandle, FontError> {
        match GlyphAtlas::from_reader(reader) {
            Ok(atlas) => {
                log::info!("loaded {}x{} glyph atlas", atlas.width(), atlas.height());
                Ok(self.add_font(atlas))
            }
            Err(e) => {
                log::warn!("font load failed, labels will not be drawn: {e}");
                Err(e)
            }
        }
    }

    pub fn font(&self, handle: FontHandle) -> Option<&GlyphAtlas> {
        self.fonts.get(handle.0)
    }

    pub fn fonts(&self) -> &[GlyphAtlas] {
        &self.fonts
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    /// Frames rendered since the surface was last created.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Statistics from the most recent frame.
    #[cfg(feature = "diagnostics")]
    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }
}
