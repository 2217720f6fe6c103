use std::fmt;
use std::time::Duration;

use crate::errors::{LandfallError, Result};
use crate::host::{MountPoint, Viewport};
use crate::intro::builder::{BuiltScene, SceneBuilder, SceneHandles};
use crate::intro::lifecycle::{self, TeardownReport};
use crate::intro::scheduler::FrameScheduler;
use crate::intro::timers::{PendingTimer, TimerState};
use crate::render::{RenderBackend, SurfaceId};
use crate::resources::{ResourceArena, color};
use crate::scene::{Camera, Scene};
use crate::settings::IntroSettings;
use crate::timeline::{AnimationTargets, Phase, Timeline, TimelineController};

type FinishCallback = Box<dyn FnOnce()>;
type PhaseListener = Box<dyn FnMut(Phase)>;

/// One playback of the intro, from mount to teardown.
///
/// The sequencer owns the mount point, the renderer it created, the scene
/// and every resource allocated for it. The host drives it with
/// [`frame`](Self::frame) on every display refresh and finally calls
/// [`teardown`](Self::teardown), which may happen in any phase.
///
/// The completion callback passed to [`initialize`](Self::initialize) runs at
/// most once: when the flash delay elapses, or on [`skip`](Self::skip),
/// whichever comes first.
///
/// Dropping a sequencer that was never torn down tears it down.
pub struct IntroSequencer<M: MountPoint> {
    /// `None` only after [`into_mount`](Self::into_mount) handed it back.
    mount: Option<M>,
    settings: IntroSettings,

    renderer: Option<M::Renderer>,
    surface: Option<SurfaceId>,
    arena: ResourceArena,
    built: Option<BuiltScene>,

    controller: TimelineController,
    scheduler: FrameScheduler,
    auto_start: Option<PendingTimer>,
    flash: Option<PendingTimer>,
    resize_subscribed: bool,

    on_finish: Option<FinishCallback>,
    listeners: Vec<PhaseListener>,
    torn_down: bool,
}

impl<M: MountPoint> IntroSequencer<M> {
    /// Creates the renderer, mounts its surface, builds the scene, registers
    /// the frame loop and arms the auto-start timer.
    ///
    /// `on_finish` is never called from here. If building fails, everything
    /// allocated so far is released before the error is returned.
    pub fn initialize(
        mut mount: M,
        settings: IntroSettings,
        on_finish: impl FnOnce() + 'static,
    ) -> Result<Self> {
        settings.validate()?;

        let viewport = mount.viewport();
        if viewport.is_empty() {
            return Err(LandfallError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let mut renderer = mount.create_renderer(&settings.renderer)?;
        renderer.set_size(viewport);
        renderer.set_clear_color(color::rgba(color::BACKGROUND, 1.0));
        let surface = renderer.surface();
        mount.attach_surface(surface);

        let mut arena = ResourceArena::new();
        let built = SceneBuilder::new(&mut arena, &mut renderer, &settings).build(viewport);

        let mut sequencer = Self {
            mount: Some(mount),
            controller: TimelineController::new(settings.timings),
            scheduler: FrameScheduler::new(settings.max_frame_delta),
            settings,
            renderer: Some(renderer),
            surface: Some(surface),
            arena,
            built: None,
            auto_start: None,
            flash: None,
            resize_subscribed: false,
            on_finish: Some(Box::new(on_finish)),
            listeners: Vec::new(),
            torn_down: false,
        };

        match built {
            Ok(built) => sequencer.built = Some(built),
            Err(err) => {
                log::error!("intro: scene build failed: {err}");
                sequencer.teardown();
                return Err(err);
            }
        }

        sequencer.scheduler.register();
        sequencer.resize_subscribed = true;
        sequencer.auto_start = Some(PendingTimer::after(Duration::from_secs_f32(
            sequencer.settings.timings.auto_start_delay,
        )));

        log::info!(
            "intro: initialized {}x{} (auto-start in {:.2}s)",
            viewport.width,
            viewport.height,
            sequencer.settings.timings.auto_start_delay
        );
        Ok(sequencer)
    }

    /// Registers a callback invoked with every phase the timeline enters.
    pub fn on_phase_change(&mut self, listener: impl FnMut(Phase) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Per-frame entry point. `now` is the host's monotonic timestamp.
    ///
    /// Polls due timers, advances the timeline by the clamped delta since
    /// the previous frame and renders. No-op once the frame loop has been
    /// cancelled.
    pub fn frame(&mut self, now: Duration) {
        if self.torn_down {
            return;
        }
        self.poll_timers(now);
        let Some(dt) = self.scheduler.tick(now) else {
            return;
        };
        self.advance(dt, now);
        self.render();
    }

    /// Fires the auto-start and flash-completion timers that are due.
    pub fn poll_timers(&mut self, now: Duration) {
        if self.torn_down {
            return;
        }
        if self.auto_start.as_mut().is_some_and(|timer| timer.poll(now)) {
            log::debug!("intro: auto-start timer fired");
            self.start();
        }
        if self.flash.as_mut().is_some_and(|timer| timer.poll(now)) {
            log::debug!("intro: flash timer fired");
            if self.controller.complete() {
                self.notify(Phase::Done);
            }
            self.fire_finish();
        }
    }

    /// Starts the animated phases. Equivalent to the auto-start timer
    /// firing; a second call is a no-op.
    pub fn start(&mut self) {
        if self.torn_down {
            log::warn!("intro: start after teardown ignored");
            return;
        }
        if let Some(timer) = self.auto_start.as_mut() {
            timer.cancel();
        }
        if self.controller.start() {
            self.notify(Phase::LightRayRise);
        }
    }

    /// Bypasses the rest of the intro: cancels pending timers, moves the
    /// timeline to `Done` and hands over to the host. Phases not yet reached
    /// are never entered.
    pub fn skip(&mut self) {
        if self.torn_down {
            log::warn!("intro: skip after teardown ignored");
            return;
        }
        self.cancel_timers();
        if self.controller.abort() {
            log::info!("intro: skipped");
            self.notify(Phase::Done);
        }
        self.fire_finish();
    }

    /// Applies a new drawable size to the camera and renderer.
    pub fn resize(&mut self, viewport: Viewport) {
        if !self.resize_subscribed {
            log::warn!("intro: resize without an active subscription ignored");
            return;
        }
        if viewport.is_empty() {
            log::debug!("intro: ignoring empty viewport {viewport:?}");
            return;
        }
        if let Some(built) = self.built.as_mut() {
            built.camera.set_aspect(viewport.aspect());
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_size(viewport);
        }
    }

    fn advance(&mut self, dt: f32, now: Duration) {
        let Some(built) = self.built.as_mut() else {
            return;
        };
        let mut targets = AnimationTargets::new(
            &mut built.scene,
            &mut built.camera,
            &mut self.arena,
            &built.handles,
        );
        let entered = self.controller.advance(dt, &mut targets);
        let clear_color = targets.clear_color;

        if let (Some(color), Some(renderer)) = (clear_color, self.renderer.as_mut()) {
            renderer.set_clear_color(color);
        }

        for phase in entered {
            if phase == Phase::Flash {
                self.arm_flash(now);
            }
            self.notify(phase);
        }
    }

    /// Arms the completion timer relative to the instant Flash was reached,
    /// which lies `elapsed` seconds before `now`.
    fn arm_flash(&mut self, now: Duration) {
        let overshoot = Duration::from_secs_f32(self.controller.timeline().elapsed());
        let delay = Duration::from_secs_f32(self.settings.timings.flash_delay);
        let due = now.saturating_sub(overshoot) + delay;
        log::debug!("intro: flash timer armed for {:.3}s", due.as_secs_f32());
        self.flash = Some(PendingTimer::at(due));
    }

    fn render(&mut self) {
        let (Some(renderer), Some(built)) = (self.renderer.as_mut(), self.built.as_mut()) else {
            return;
        };
        built.scene.update_world_matrices();
        renderer.render(&built.scene, &built.camera, &self.arena);
    }

    fn notify(&mut self, phase: Phase) {
        for listener in &mut self.listeners {
            listener(phase);
        }
    }

    fn fire_finish(&mut self) {
        match self.on_finish.take() {
            Some(on_finish) => {
                log::info!("intro: finished");
                on_finish();
            }
            None => log::debug!("intro: completion already delivered"),
        }
    }

    fn cancel_timers(&mut self) -> usize {
        [self.auto_start.as_mut(), self.flash.as_mut()]
            .into_iter()
            .flatten()
            .map(PendingTimer::cancel)
            .filter(|&cancelled| cancelled)
            .count()
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Releases everything this sequencer owns. Safe in any phase, after a
    /// failed build and on repeated calls.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport {
            timers_cancelled: self.cancel_timers(),
            scheduler_cancelled: self.scheduler.cancel(),
            resize_unsubscribed: std::mem::take(&mut self.resize_subscribed),
            ..Default::default()
        };

        if let Some(built) = self.built.take() {
            report.graph =
                lifecycle::release_scene_graph(&built.scene, &mut self.arena, &mut self.renderer);
            report.detached =
                lifecycle::release_buffers(&mut self.arena, &[built.handles.particle_buffer]);
        }
        report.detached += lifecycle::sweep_arena(&mut self.arena, &mut self.renderer);

        if let (Some(surface), Some(mount)) = (self.surface.take(), self.mount.as_mut())
            && mount.contains_surface(surface)
        {
            mount.detach_surface(surface);
            report.surface_detached = true;
        }

        if let Some(mut renderer) = self.renderer.take() {
            renderer.dispose();
            report.renderer_disposed = true;
        }

        self.torn_down = true;
        if report.is_noop() {
            log::debug!("intro: teardown found nothing to release");
        } else {
            log::info!("intro: teardown {report}");
        }
        report
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.controller.phase()
    }

    #[inline]
    #[must_use]
    pub fn timeline(&self) -> Timeline {
        self.controller.timeline()
    }

    #[must_use]
    pub fn settings(&self) -> &IntroSettings {
        &self.settings
    }

    /// Whether the completion callback has been delivered.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.on_finish.is_none()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    #[must_use]
    pub fn is_frame_loop_registered(&self) -> bool {
        self.scheduler.is_registered()
    }

    /// Whether the auto-start timer is still waiting to fire.
    #[must_use]
    pub fn auto_start_pending(&self) -> bool {
        self.auto_start
            .as_ref()
            .is_some_and(|timer| timer.state() == TimerState::Pending)
    }

    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.built.as_ref().map(|built| &built.scene)
    }

    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        self.built.as_ref().map(|built| &built.camera)
    }

    #[must_use]
    pub fn handles(&self) -> Option<&SceneHandles> {
        self.built.as_ref().map(|built| &built.handles)
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceArena {
        &self.arena
    }

    #[must_use]
    pub fn renderer(&self) -> Option<&M::Renderer> {
        self.renderer.as_ref()
    }

    #[must_use]
    pub fn mount(&self) -> Option<&M> {
        self.mount.as_ref()
    }

    pub fn mount_mut(&mut self) -> Option<&mut M> {
        self.mount.as_mut()
    }

    /// Tears down (if not yet done) and gives the mount point back, so the
    /// host can initialize a fresh sequencer on it.
    #[must_use]
    pub fn into_mount(mut self) -> M {
        if !self.torn_down {
            self.teardown();
        }
        match self.mount.take() {
            Some(mount) => mount,
            None => unreachable!("mount is only taken by into_mount"),
        }
    }
}

impl<M: MountPoint> Drop for IntroSequencer<M> {
    fn drop(&mut self) {
        if !self.torn_down {
            log::debug!("intro: dropped in {} without teardown", self.controller.phase());
            self.teardown();
        }
    }
}

impl<M: MountPoint> fmt::Debug for IntroSequencer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntroSequencer")
            .field("phase", &self.controller.phase())
            .field("finished", &self.is_finished())
            .field("torn_down", &self.torn_down)
            .field("outstanding", &self.arena.outstanding())
            .finish_non_exhaustive()
    }
}
