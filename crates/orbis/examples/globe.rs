//! Interactive globe viewer.
//!
//! ```text
//! cargo run --example globe --features viewer -- [earth.jpg] [font.bff]
//! ```
//!
//! Drag to rotate, scroll to zoom, Q/E to twist, click a dot to select it.
//! Without a texture the globe shows a generated latitude/longitude grid;
//! without a font the overlays draw dots only.

use std::fs::File;
use std::sync::Arc;

use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use orbis::prelude::*;

/// Cursor travel below which a press and release count as a tap.
const TAP_SLOP: f32 = 4.0;
/// Span of the synthetic pinch used for mouse-wheel zoom.
const WHEEL_SPAN: f32 = 100.0;
/// Degrees per Q/E key press.
const TWIST_STEP: f32 = 5.0;

// ── Demo content ────────────────────────────────────────────────────────

/// (label, latitude, longitude) in degrees; east and north are positive.
const PLACES: [(&str, f32, f32); 5] = [
    ("Zero", 0.0, 0.0),
    ("Melbourne", -37.7833, 144.9667),
    ("Cape Town", -33.9767, 18.4244),
    ("Cairo", 30.0100, 31.2100),
    ("New York", 40.7142, -74.0064),
];

/// A soft round glow for the overlay dots, premultiplied for additive blending.
fn dot_pixels(size: u32) -> Vec<u8> {
    let c = (size as f32 - 1.0) / 2.0;
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let d = Vec2::new(x as f32 - c, y as f32 - c).length() / c;
            let glow = (1.0 - d).clamp(0.0, 1.0).powf(1.5);
            let v = (glow * 255.0) as u8;
            pixels.extend_from_slice(&[v, v, v, v]);
        }
    }
    pixels
}

/// An ocean-blue equirectangular grid with lines every 15 degrees.
fn grid_pixels(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let lon = x as f32 / width as f32 * 360.0;
            let lat = y as f32 / height as f32 * 180.0;
            let line = lon % 15.0 < 0.75 || lat % 15.0 < 0.75;
            let rgba = if line {
                [220, 220, 200, 255]
            } else {
                [20, 60, 120, 255]
            };
            pixels.extend_from_slice(&rgba);
        }
    }
    pixels
}

// ── App ─────────────────────────────────────────────────────────────────

struct Viewer {
    engine: GlobeEngine,
    gestures: GestureAdapter,
    texture_path: Option<String>,
    font_path: Option<String>,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    cursor: Vec2,
    press: Option<Vec2>,
    dragged: bool,
}

impl Viewer {
    fn new(texture_path: Option<String>, font_path: Option<String>) -> Self {
        Self {
            engine: GlobeEngine::default(),
            gestures: GestureAdapter::new(1.0),
            texture_path,
            font_path,
            window: None,
            backend: None,
            cursor: Vec2::ZERO,
            press: None,
            dragged: false,
        }
    }

    fn setup_planet(&mut self, backend: &mut WgpuBackend) {
        let globe_texture = match &self.texture_path {
            Some(path) => match backend.load_texture(path) {
                Ok(handle) => handle,
                Err(e) => {
                    log::warn!("could not load '{path}': {e}; using grid");
                    backend.insert_rgba8("grid", 1024, 512, &grid_pixels(1024, 512))
                }
            },
            None => backend.insert_rgba8("grid", 1024, 512, &grid_pixels(1024, 512)),
        };

        let font = self.font_path.as_ref().and_then(|path| match File::open(path) {
            Ok(file) => self.engine.load_font(file).ok(),
            Err(e) => {
                log::warn!("could not open font '{path}': {e}");
                None
            }
        });

        let dot = backend.insert_rgba8("dot", 64, 64, &dot_pixels(64));
        for (label, lat, lon) in PLACES {
            let mut overlay = Overlay::new(self.engine.surface_point(lat, lon))
                .with_label(label)
                .with_dot_texture(dot);
            if let Some(font) = font {
                overlay = overlay.with_font(font);
            }
            self.engine.add_overlay(overlay);
        }

        self.engine.update_texture(globe_texture);
    }

    fn gesture(&mut self, event: GestureEvent) {
        match self.gestures.handle(&mut self.engine, event) {
            GestureResponse::Selected(id) => {
                let label = self.engine.overlay(id).and_then(Overlay::label).unwrap_or("");
                log::info!("selected overlay {} '{label}'", id.index());
            }
            GestureResponse::ZoomRejected => log::debug!("zoom limit reached"),
            _ => {}
        }
    }

    fn zoom_by_wheel(&mut self, lines: f32) {
        if self.gestures.mode() == TransformMode::Drag {
            return;
        }
        self.gesture(GestureEvent::ScaleBegin { span: WHEEL_SPAN });
        self.gesture(GestureEvent::Scale {
            span: WHEEL_SPAN * (1.0 + lines * 0.1).max(0.1),
        });
        self.gesture(GestureEvent::Up);
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("orbis")
            .with_inner_size(winit::dpi::LogicalSize::new(1024.0, 768.0));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("could not create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let gpu = match GpuContext::new(window.clone(), size.width, size.height) {
            Ok(gpu) => gpu,
            Err(e) => {
                log::error!("could not initialize the GPU: {e}");
                event_loop.exit();
                return;
            }
        };
        let mut backend = WgpuBackend::new(gpu);

        self.gestures.set_density(window.scale_factor() as f32);
        self.setup_planet(&mut backend);
        self.engine.create_surface(&mut backend);
        self.engine.update_surface(size.width, size.height);

        window.request_redraw();
        self.window = Some(window);
        self.backend = Some(backend);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("window close requested, exiting");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(backend) = &mut self.backend {
                    backend.resize(size.width, size.height);
                }
                self.engine.update_surface(size.width, size.height);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.gestures.set_density(scale_factor as f32);
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                if let Some(start) = self.press {
                    if self.cursor.distance(start) > TAP_SLOP {
                        self.dragged = true;
                    }
                    self.gesture(GestureEvent::Move { position: self.cursor });
                }
            }

            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => match state {
                ElementState::Pressed => {
                    self.press = Some(self.cursor);
                    self.dragged = false;
                    self.gesture(GestureEvent::Down { position: self.cursor });
                }
                ElementState::Released => {
                    self.gesture(GestureEvent::Up);
                    if self.press.take().is_some() && !self.dragged {
                        self.gesture(GestureEvent::Tap { position: self.cursor });
                    }
                }
            },

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                self.zoom_by_wheel(lines);
            }

            WindowEvent::Touch(touch) => {
                let position = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                let event = match touch.phase {
                    TouchPhase::Started => GestureEvent::Down { position },
                    TouchPhase::Moved => GestureEvent::Move { position },
                    TouchPhase::Ended | TouchPhase::Cancelled => GestureEvent::Up,
                };
                self.gesture(event);
            }

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::KeyQ) => {
                        self.gesture(GestureEvent::Twist { degrees: TWIST_STEP })
                    }
                    PhysicalKey::Code(KeyCode::KeyE) => {
                        self.gesture(GestureEvent::Twist { degrees: -TWIST_STEP })
                    }
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ => {}
                }
            }

            WindowEvent::RedrawRequested => {
                if let Some(backend) = &mut self.backend {
                    if let Err(e) = self.engine.render_frame(backend) {
                        log::warn!("frame skipped: {e}");
                    }
                }

                #[cfg(feature = "diagnostics")]
                {
                    if self.engine.frames_rendered() % 600 == 0 {
                        if let Ok(json) = self.engine.frame_stats().to_json() {
                            log::debug!("{json}");
                        }
                    }
                }

                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            _ => {}
        }
    }
}

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let texture_path = args.next();
    let font_path = args.next();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("could not create event loop: {e}");
            return;
        }
    };
    let mut viewer = Viewer::new(texture_path, font_path);
    if let Err(e) = event_loop.run_app(&mut viewer) {
        log::error!("event loop error: {e}");
    }
}
