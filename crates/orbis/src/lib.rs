//! # Orbis — Interactive Globe Rendering
//!
//! A textured, lit planet that the user spins, twists and zooms, with
//! labeled markers pinned to its surface. The crate computes everything a
//! renderer needs (sphere geometry, camera matrices, overlay placement and
//! text layout) and hands it to a pluggable [`RenderBackend`](render::RenderBackend).
//!
//! Start with `use orbis::prelude::*`, build a [`GlobeEngine`](engine::GlobeEngine),
//! and drive it with [`GestureEvent`](gesture::GestureEvent)s.

pub mod camera;
pub mod config;
pub mod engine;
pub mod error;
pub mod font;
pub mod gesture;
pub mod hit;
pub mod math;
pub mod mesh;
pub mod overlay;
pub mod prelude;
pub mod projection;
pub mod render;

#[cfg(feature = "diagnostics")]
pub mod diag;
