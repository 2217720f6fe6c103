//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use landfall::intro::{BuiltScene, SceneBuilder};
use landfall::render::SharedRenderLog;
use landfall::{
    HeadlessRenderer, IntroSequencer, IntroSettings, LandfallError, MountPoint, RendererOptions,
    ResourceArena, SurfaceId, Viewport,
};

pub const EPSILON: f32 = 1e-4;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// 60 Hz frame interval in whole microseconds, so timestamps add up exactly.
pub const FRAME: Duration = Duration::from_micros(16_667);

/// What the host side of a [`TestMount`] observed.
#[derive(Debug, Default)]
pub struct MountState {
    pub mounted: Vec<SurfaceId>,
    pub attach_calls: usize,
    pub detach_calls: usize,
    pub renderer_logs: Vec<SharedRenderLog>,
}

impl MountState {
    pub fn last_log(&self) -> SharedRenderLog {
        Rc::clone(self.renderer_logs.last().expect("a renderer was created"))
    }
}

/// Mount point backed by a headless renderer.
pub struct TestMount {
    pub viewport: Viewport,
    pub state: Rc<RefCell<MountState>>,
    pub geometry_budget: Option<usize>,
    pub refuse_renderer: bool,
}

impl TestMount {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            state: Rc::default(),
            geometry_budget: None,
            refuse_renderer: false,
        }
    }

    pub fn with_geometry_budget(mut self, budget: usize) -> Self {
        self.geometry_budget = Some(budget);
        self
    }

    pub fn state(&self) -> Rc<RefCell<MountState>> {
        Rc::clone(&self.state)
    }
}

impl MountPoint for TestMount {
    type Renderer = HeadlessRenderer;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn create_renderer(&mut self, options: &RendererOptions) -> landfall::Result<HeadlessRenderer> {
        if self.refuse_renderer {
            return Err(LandfallError::SurfaceCreation("no surface available".into()));
        }
        let mut renderer = HeadlessRenderer::new(self.viewport).with_shadows(options.shadows);
        if let Some(budget) = self.geometry_budget {
            renderer = renderer.with_geometry_budget(budget);
        }
        self.state.borrow_mut().renderer_logs.push(renderer.log());
        Ok(renderer)
    }

    fn attach_surface(&mut self, surface: SurfaceId) {
        let mut state = self.state.borrow_mut();
        state.mounted.push(surface);
        state.attach_calls += 1;
    }

    fn detach_surface(&mut self, surface: SurfaceId) {
        let mut state = self.state.borrow_mut();
        state.mounted.retain(|&s| s != surface);
        state.detach_calls += 1;
    }

    fn contains_surface(&self, surface: SurfaceId) -> bool {
        self.state.borrow().mounted.contains(&surface)
    }
}

/// Defaults with a small particle field.
pub fn settings() -> IntroSettings {
    IntroSettings::default().with_particle_count(32)
}

/// Counts completion callbacks.
pub fn finish_counter() -> (Rc<RefCell<usize>>, impl FnOnce() + 'static) {
    let count = Rc::new(RefCell::new(0));
    let inner = Rc::clone(&count);
    (count, move || *inner.borrow_mut() += 1)
}

/// Routes `log` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn initialize(mount: TestMount) -> (IntroSequencer<TestMount>, Rc<RefCell<usize>>) {
    init_logging();
    let (finished, on_finish) = finish_counter();
    let intro = IntroSequencer::initialize(mount, settings(), on_finish).expect("intro initializes");
    (intro, finished)
}

/// Drives frames at 60 Hz from `*now` until `until` holds or `limit` passes.
/// Returns whether the condition was reached.
pub fn run_until(
    intro: &mut IntroSequencer<TestMount>,
    now: &mut Duration,
    limit: Duration,
    mut until: impl FnMut(&IntroSequencer<TestMount>) -> bool,
) -> bool {
    while *now <= limit {
        intro.frame(*now);
        if until(intro) {
            return true;
        }
        *now += FRAME;
    }
    false
}

/// Builds the intro scene outside a sequencer.
pub fn build_scene(settings: &IntroSettings) -> (ResourceArena, HeadlessRenderer, BuiltScene) {
    let mut arena = ResourceArena::new();
    let mut renderer = HeadlessRenderer::new(Viewport::new(1280, 720));
    let built = SceneBuilder::new(&mut arena, &mut renderer, settings)
        .build(Viewport::new(1280, 720))
        .expect("scene builds");
    (arena, renderer, built)
}
