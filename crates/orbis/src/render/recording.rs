//! A backend that records calls instead of drawing.

use super::{Billboard, Frame, LabelDraw, RenderBackend, SurfaceSetup, TextureHandle};
use crate::math::{Mat4, Viewport};

/// An owned snapshot of a submitted [`Frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub viewport: Viewport,
    pub projection: Mat4,
    pub model: Mat4,
    pub globe_texture: Option<TextureHandle>,
    pub vertex_count: usize,
    pub billboards: Vec<Billboard>,
    pub labels: Vec<LabelDraw>,
}

/// One call made on a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Prepare(SurfaceSetup),
    SwapGlobeTexture(TextureHandle),
    Submit(FrameRecord),
}

/// Records every [`RenderBackend`] call in order.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submitted frames, oldest first.
    pub fn frames(&self) -> impl Iterator<Item = &FrameRecord> {
        self.calls.iter().filter_map(|call| match call {
            BackendCall::Submit(frame) => Some(frame),
            _ => None,
        })
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames().last()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn prepare(&mut self, setup: &SurfaceSetup) {
        self.calls.push(BackendCall::Prepare(*setup));
    }

    fn swap_globe_texture(&mut self, texture: TextureHandle) {
        self.calls.push(BackendCall::SwapGlobeTexture(texture));
    }

    fn submit(&mut self, frame: &Frame<'_>) {
        self.calls.push(BackendCall::Submit(FrameRecord {
            viewport: frame.viewport,
            projection: frame.projection,
            model: frame.model,
            globe_texture: frame.globe.texture,
            vertex_count: frame.globe.vertex_count,
            billboards: frame.billboards.clone(),
            labels: frame.labels.clone(),
        }));
    }
}
