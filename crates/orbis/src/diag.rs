//! Per-frame diagnostics.
//!
//! Enabled by the `diagnostics` feature flag. The engine fills a
//! [`FrameStats`] snapshot on every [`render_frame`] and keeps the latest one.
//! Snapshots serialize to JSON so external tooling can log or plot them.
//!
//! [`render_frame`]: crate::engine::GlobeEngine::render_frame

use serde::Serialize;

// ── Snapshot (wire format) ──────────────────────────────────────────────

/// What the last frame drew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FrameStats {
    /// Frames rendered since the surface was created.
    pub frame: u64,
    /// CPU time spent composing and submitting the frame.
    pub frame_time_ms: f32,
    pub mesh_vertices: usize,
    pub overlays_drawn: usize,
    /// Overlays hidden behind the planet.
    pub overlays_culled: usize,
    pub labels_drawn: usize,
    pub glyph_quads: usize,
    /// Whether a pending globe texture was applied this frame.
    pub texture_swapped: bool,
    pub field_of_view: f32,
}

impl FrameStats {
    /// Serialize to a single-line JSON object.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_all_counters() {
        let stats = FrameStats {
            frame: 3,
            overlays_drawn: 2,
            overlays_culled: 1,
            texture_swapped: true,
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(value["frame"], 3);
        assert_eq!(value["overlays_drawn"], 2);
        assert_eq!(value["overlays_culled"], 1);
        assert_eq!(value["texture_swapped"], true);
        assert_eq!(value["glyph_quads"], 0);
    }
}
