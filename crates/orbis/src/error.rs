//! Error types, one enum per concern.
//!
//! Glyph atlas decoding, configuration loading, and engine lifecycle misuse
//! each get their own `thiserror` enum so callers can match on what they can
//! actually recover from. Parameter rejects (an out-of-range field of view)
//! and hit-test misses are not errors; they return `false` and `None`.

use std::path::PathBuf;

/// Errors from decoding a BFF2 glyph atlas.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("not a BFF2 font: signature {0:#04x} {1:#04x}")]
    BadSignature(u8, u8),

    #[error("font {section} truncated: expected {expected} bytes, got {actual}")]
    ShortRead {
        section: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid glyph cell size {width}x{height}")]
    InvalidCellSize { width: i32, height: i32 },

    #[error("invalid atlas size {width}x{height}")]
    InvalidAtlasSize { width: i32, height: i32 },

    #[error("unsupported color depth: {0} bits per pixel")]
    UnsupportedDepth(u8),

    #[error("font read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from loading or validating a [`GlobeConfig`](crate::config::GlobeConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Lifecycle errors from [`GlobeEngine`](crate::engine::GlobeEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("render surface has not been created")]
    SurfaceNotCreated,

    #[error("render surface has no size yet")]
    SurfaceNotSized,
}

/// Errors from the wgpu backend.
#[cfg(feature = "wgpu")]
#[derive(Debug, thiserror::Error)]
pub enum GpuError {
    #[error("surface creation failed: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("device request failed: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_error_display() {
        let err = FontError::BadSignature(0x42, 0x4d);
        assert_eq!(err.to_string(), "not a BFF2 font: signature 0x42 0x4d");

        let err = FontError::ShortRead {
            section: "widths",
            expected: 256,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "font widths truncated: expected 256 bytes, got 10"
        );

        let err = FontError::UnsupportedDepth(16);
        assert_eq!(err.to_string(), "unsupported color depth: 16 bits per pixel");
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::Invalid("stacks must be at least 1".into());
        assert_eq!(err.to_string(), "invalid config: stacks must be at least 1");
    }

    #[test]
    fn engine_error_display() {
        assert_eq!(
            EngineError::SurfaceNotCreated.to_string(),
            "render surface has not been created"
        );
        assert_eq!(
            EngineError::SurfaceNotSized.to_string(),
            "render surface has no size yet"
        );
    }
}
