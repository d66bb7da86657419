//! Reference host for the swarm: a winit window driving one tick per frame.
//!
//! Per redraw the app advances the [`FrameClock`], ticks the store unless
//! paused, uploads dirty trails, then draws. Controls:
//!
//! - left drag: orbit
//! - wheel: zoom
//! - Space: pause / resume
//! - Escape: quit

mod camera;
mod renderer;

pub use camera::Camera;
pub use renderer::GpuState;

use std::sync::Arc;

use glam::Vec3;
use rand::rngs::StdRng;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::clock::FrameClock;
use crate::config::SwarmConfig;
use crate::error::ViewerError;
use crate::store::TrailStore;

/// Open a window and run the swarm until it is closed.
pub fn run(config: SwarmConfig) -> Result<(), ViewerError> {
    let store = config.build_store()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, store);
    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct App {
    config: SwarmConfig,
    store: TrailStore<StdRng>,
    clock: FrameClock,
    camera: Camera,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    /// Start-up error to hand back from [`run`].
    failure: Option<ViewerError>,
}

impl App {
    fn new(config: SwarmConfig, store: TrailStore<StdRng>) -> Self {
        let camera = Camera::from_position(Vec3::from_array(config.camera.position), config.camera.damping);
        Self {
            config,
            store,
            clock: FrameClock::new(),
            camera,
            window: None,
            gpu_state: None,
            mouse_pressed: false,
            last_mouse_pos: None,
            failure: None,
        }
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title("attractor-swarm")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(window.clone());

        let gpu_state = pollster::block_on(GpuState::new(
            window,
            self.config.visuals.clone(),
            self.store.particle_count(),
            self.store.trail_length(),
        ))?;
        self.gpu_state = Some(gpu_state);

        info!(
            particles = self.store.particle_count(),
            trail_length = self.store.trail_length(),
            "viewer started"
        );
        Ok(())
    }

    fn frame(&mut self) {
        if self.clock.update() {
            self.store.tick();

            let interval = self.config.fps_report_interval;
            if self.clock.report_due(interval) {
                let stats = self.store.stats();
                info!(
                    fps = self.clock.instant_fps().round(),
                    avg_fps = self.clock.fps().round(),
                    frame = self.clock.frame(),
                    reseeds = stats.last_tick,
                    "frame"
                );
            }
        }

        self.camera.update();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init_gpu(event_loop) {
                error!(%err, "failed to start viewer");
                self.failure = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) => {
                        self.clock.toggle_pause();
                        info!(paused = self.clock.is_paused(), "toggled pause");
                    }
                    PhysicalKey::Code(KeyCode::Escape) => event_loop.exit(),
                    _ => {}
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        self.camera
                            .drag((position.x - last_x) as f32, (position.y - last_y) as f32);
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => {
                self.frame();

                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.upload(&mut self.store);
                    match gpu_state.render(&self.camera, self.store.valid_len()) {
                        Ok(_) => {}
                        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                            gpu_state.resize(winit::dpi::PhysicalSize {
                                width: gpu_state.config.width,
                                height: gpu_state.config.height,
                            })
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("GPU out of memory");
                            event_loop.exit();
                        }
                        Err(e) => warn!(error = ?e, "render error"),
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
