use std::sync::Arc;
use std::time::Instant;

use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::ActiveEventLoop,
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::demo::Arena;
use crate::renderer::context::SurfaceContext;
use crate::renderer::error::RenderError;
use crate::scene::Scene;
use crate::settings::RenderSettings;

struct Running {
    window: Arc<Window>,
    surface: SurfaceContext,
    scene: Scene,
    arena: Arena,
    last_frame: Instant,
}

pub struct App {
    settings: RenderSettings,
    running: Option<Running>,
}

impl App {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            running: None,
        }
    }

    fn start(&self, window: Arc<Window>) -> Result<Running, RenderError> {
        let surface = pollster::block_on(SurfaceContext::new(window.clone(), &self.settings))?;
        let size = surface.size();
        let mut scene = Scene::new(&surface.gpu, &self.settings, size.width, size.height)?;
        let arena = Arena::new(&surface.gpu, &mut scene, &self.settings)?;
        Ok(Running {
            window,
            surface,
            scene,
            arena,
            last_frame: Instant::now(),
        })
    }
}

impl Running {
    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.arena.update(&mut self.scene, dt);

        let frame = match self.surface.acquire() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("Skipping frame: {err}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let objects = self.arena.renderables();
        self.scene.render(&self.surface.gpu, &objects, &view);
        self.window.pre_present_notify();
        frame.present();
    }

    fn resize(&mut self, size: winit::dpi::PhysicalSize<u32>) {
        if self.surface.resize(size) {
            self.scene.resize(&self.surface.gpu, size.width, size.height);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }
        let resolution = &self.settings.resolution;
        let attributes = Window::default_attributes()
            .with_title("kamikaze")
            .with_inner_size(winit::dpi::PhysicalSize::new(resolution.width, resolution.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        match self.start(window) {
            Ok(running) => {
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(err) => {
                log::error!("Failed to start renderer: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };
        if running.window.id() != id {
            return;
        }

        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                if let Some(running) = self.running.take() {
                    running.scene.release();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.resize(size);
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = running.window.inner_size();
                running.resize(size);
            }
            WindowEvent::RedrawRequested => {
                running.redraw();
                running.window.request_redraw();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(running) = self.running.take() {
                    running.scene.release();
                }
                event_loop.exit();
            }
            _ => {}
        }
    }
}
