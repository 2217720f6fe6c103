//! Intro Viewer
//!
//! Hosts the landing intro in a winit window.
//!
//! - `Space`: skip to the end
//! - `R`: tear down and replay
//! - `Escape`: quit
//!
//! An optional first argument names a JSON settings file.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use landfall::{
    IntroSequencer, IntroSettings, MountPoint, RendererOptions, SurfaceId, Viewport, WgpuRenderer,
};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowId};

/// The window is the mount point; its one surface is the renderer's.
struct WindowMount {
    window: Arc<Window>,
    mounted: Option<SurfaceId>,
}

impl MountPoint for WindowMount {
    type Renderer = WgpuRenderer;

    fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height)
    }

    fn create_renderer(&mut self, options: &RendererOptions) -> landfall::Result<WgpuRenderer> {
        pollster::block_on(WgpuRenderer::new(
            self.window.clone(),
            options,
            self.viewport(),
        ))
    }

    fn attach_surface(&mut self, surface: SurfaceId) {
        self.mounted = Some(surface);
    }

    fn detach_surface(&mut self, surface: SurfaceId) {
        if self.mounted == Some(surface) {
            self.mounted = None;
        }
    }

    fn contains_surface(&self, surface: SurfaceId) -> bool {
        self.mounted == Some(surface)
    }
}

struct Viewer {
    settings: IntroSettings,
    window: Option<Arc<Window>>,
    intro: Option<IntroSequencer<WindowMount>>,
    clock: Instant,
}

impl Viewer {
    fn new(settings: IntroSettings) -> Self {
        Self {
            settings,
            window: None,
            intro: None,
            clock: Instant::now(),
        }
    }

    fn play(&mut self, mount: WindowMount) -> landfall::Result<()> {
        let mut intro = IntroSequencer::initialize(mount, self.settings.clone(), || {
            log::info!("intro finished, handing over to the main view");
        })?;
        intro.on_phase_change(|phase| log::info!("phase -> {phase}"));
        self.intro = Some(intro);
        Ok(())
    }

    fn replay(&mut self, event_loop: &ActiveEventLoop) {
        let Some(intro) = self.intro.take() else {
            return;
        };
        let mount = intro.into_mount();
        if let Err(e) = self.play(mount) {
            log::error!("Replay failed: {e}");
            event_loop.exit();
        }
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed || event.repeat {
            return;
        }
        match event.logical_key.as_ref() {
            Key::Named(NamedKey::Space) => {
                if let Some(intro) = self.intro.as_mut() {
                    intro.skip();
                }
            }
            Key::Named(NamedKey::Escape) => event_loop.exit(),
            Key::Character(c) if c.eq_ignore_ascii_case("r") => self.replay(event_loop),
            _ => {}
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title("Landfall")
            .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let mount = WindowMount {
            window: window.clone(),
            mounted: None,
        };
        if let Err(e) = self.play(mount) {
            log::error!("Fatal Renderer Error: {e}");
            event_loop.exit();
            return;
        }

        self.clock = Instant::now();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(intro) = self.intro.as_mut() {
                    intro.resize(Viewport::new(size.width, size.height));
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),
            WindowEvent::RedrawRequested => {
                if let Some(intro) = self.intro.as_mut() {
                    intro.frame(self.clock.elapsed());
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut intro) = self.intro.take() {
            log::info!("{}", intro.teardown());
        }
    }
}

fn load_settings() -> anyhow::Result<IntroSettings> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings from {path}"))?;
            Ok(IntroSettings::from_json_str(&json)?)
        }
        None => Ok(IntroSettings::default()),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(settings);
    event_loop.run_app(&mut viewer)?;
    Ok(())
}
