//! Common imports: `use orbis::prelude::*`.

pub use crate::config::GlobeConfig;
pub use crate::engine::{GlobeEngine, SurfacePhase};
pub use crate::error::{ConfigError, EngineError, FontError};
pub use crate::font::{FontHandle, GlyphAtlas, TextStyle};
pub use crate::gesture::{GestureAdapter, GestureEvent, GestureResponse, TransformMode};
pub use crate::math::{Color, Mat4, Vec2, Vec3, Vec4, Viewport};
pub use crate::overlay::{Overlay, OverlayId, geodetic_to_cartesian};
pub use crate::render::{Frame, RecordingBackend, RenderBackend, TextureHandle};

#[cfg(feature = "wgpu")]
pub use crate::render::gpu::{GpuContext, WgpuBackend};
