//! Engine configuration.
//!
//! [`GlobeConfig`] collects every tunable the engine reads at construction:
//! mesh resolution, clipping planes, field-of-view bounds, drag damping, and
//! so on. It round-trips through JSON with `serde_json`, and every field has a
//! default, so a config file only needs the keys it changes:
//!
//! ```json
//! { "stacks": 90, "slices": 90, "texture_offset": [0.25, 0.0] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::math::{Color, Vec2};

/// Tunables for a [`GlobeEngine`](crate::engine::GlobeEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeConfig {
    /// Latitude bands in the sphere mesh.
    pub stacks: u32,
    /// Longitude columns in the sphere mesh (the last one closes the seam).
    pub slices: u32,
    pub radius: f32,
    /// Vertical scale applied to mesh positions.
    pub squash: f32,
    /// Distance from the eye to the planet center along -Z.
    pub planet_distance: f32,
    pub near_clip: f32,
    pub far_clip: f32,
    /// Field of view when the surface is created.
    pub default_fov: f32,
    pub min_fov: f32,
    pub max_fov: f32,
    /// Drag distances are divided by `density * drag_damping` to get degrees.
    pub drag_damping: f32,
    /// Overlays whose projected depth exceeds this are behind the planet.
    pub behind_planet_depth: f32,
    pub texture_offset: Vec2,
    pub clear_color: Color,
}

impl Default for GlobeConfig {
    fn default() -> Self {
        Self {
            stacks: 180,
            slices: 180,
            radius: 1.0,
            squash: 1.0,
            planet_distance: 10.0,
            near_clip: 0.1,
            far_clip: 20.0,
            default_fov: 30.0,
            min_fov: 5.0,
            max_fov: 100.0,
            drag_damping: 4.0,
            behind_planet_depth: 10.0,
            texture_offset: Vec2::new(0.25, 0.0),
            clear_color: Color::BLACK,
        }
    }
}

impl GlobeConfig {
    /// Parse a JSON config. Missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("loaded globe config from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.stacks == 0 {
            return invalid("stacks must be at least 1".into());
        }
        if self.slices < 2 {
            return invalid(format!("slices must be at least 2, got {}", self.slices));
        }
        if !(self.radius > 0.0) {
            return invalid(format!("radius must be positive, got {}", self.radius));
        }
        if !(self.near_clip > 0.0) {
            return invalid(format!("near clip must be positive, got {}", self.near_clip));
        }
        if !(self.far_clip > self.near_clip) {
            return invalid(format!(
                "far clip {} must exceed near clip {}",
                self.far_clip, self.near_clip
            ));
        }
        if !(self.min_fov > 0.0 && self.min_fov <= self.max_fov) {
            return invalid(format!(
                "fov bounds {}..={} are not a positive range",
                self.min_fov, self.max_fov
            ));
        }
        if !(self.min_fov..=self.max_fov).contains(&self.default_fov) {
            return invalid(format!(
                "default fov {} outside {}..={}",
                self.default_fov, self.min_fov, self.max_fov
            ));
        }
        if !(self.drag_damping > 0.0 && self.drag_damping.is_finite()) {
            return invalid(format!("drag damping must be positive, got {}", self.drag_damping));
        }
        Ok(())
    }
}
