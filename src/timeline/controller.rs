use smallvec::SmallVec;

use crate::settings::PhaseTimings;
use crate::timeline::Phase;
use crate::timeline::laws::{self, AnimationTargets, PhaseProgress};

/// Phases entered during one call, in order.
pub type Entered = SmallVec<[Phase; 4]>;

/// Current position of the intro: the active phase and the seconds spent in
/// it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    phase: Phase,
    elapsed: f32,
}

impl Timeline {
    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Seconds spent in the current phase. On entry to `Flash` this is the
    /// overflow carried from `Aiming`.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self {
            phase: Phase::Waiting,
            elapsed: 0.0,
        }
    }
}

/// Phase state machine advanced by elapsed-time deltas.
///
/// The controller is the only writer of its [`Timeline`]. Animated phases end
/// when their duration is reached; leftover time carries into the next phase
/// so playback does not depend on the frame rate. `Flash` waits for
/// [`complete`](Self::complete), which the sequencer calls from the flash
/// timer.
#[derive(Debug, Clone)]
pub struct TimelineController {
    timings: PhaseTimings,
    timeline: Timeline,
}

impl TimelineController {
    #[must_use]
    pub fn new(timings: PhaseTimings) -> Self {
        Self {
            timings,
            timeline: Timeline::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.timeline.phase
    }

    #[inline]
    #[must_use]
    pub fn timings(&self) -> &PhaseTimings {
        &self.timings
    }

    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.timeline.phase != Phase::Waiting
    }

    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.timeline.phase.is_terminal()
    }

    /// Waiting → LightRayRise. Returns `false` (and does nothing) if the
    /// timeline already left `Waiting`.
    pub fn start(&mut self) -> bool {
        if self.is_started() {
            log::debug!("timeline: start ignored in phase {}", self.timeline.phase);
            return false;
        }
        self.enter_phase(Phase::LightRayRise, 0.0);
        true
    }

    /// Advances by `dt` seconds, applying the active law and crossing as
    /// many phase boundaries as the delta covers.
    ///
    /// Every crossed phase has its law applied at progress 1 before the
    /// next one is entered. No-op while `Waiting` or `Done`.
    pub fn advance(&mut self, dt: f32, targets: &mut AnimationTargets<'_>) -> Entered {
        let mut entered = Entered::new();
        if !self.is_started() || self.is_done() {
            return entered;
        }

        let dt = dt.max(0.0);
        laws::drift_particles(dt, targets);
        self.timeline.elapsed += dt;

        while let Some(duration) = self.timings.duration(self.timeline.phase) {
            let law = laws::law_for(self.timeline.phase);

            if self.timeline.elapsed < duration {
                if let Some(law) = law {
                    law(
                        PhaseProgress {
                            progress: self.timeline.elapsed / duration,
                            elapsed: self.timeline.elapsed,
                        },
                        targets,
                    );
                }
                break;
            }

            if let Some(law) = law {
                law(
                    PhaseProgress {
                        progress: 1.0,
                        elapsed: duration,
                    },
                    targets,
                );
            }

            let overflow = self.timeline.elapsed - duration;
            let next = self.timeline.phase.next();
            self.enter_phase(next, overflow);
            laws::enter(next, targets);
            entered.push(next);
        }

        entered
    }

    /// Flash → Done. Returns `false` from any other phase.
    pub fn complete(&mut self) -> bool {
        if self.timeline.phase != Phase::Flash {
            log::debug!("timeline: complete ignored in phase {}", self.timeline.phase);
            return false;
        }
        self.enter_phase(Phase::Done, 0.0);
        true
    }

    /// Jumps straight to `Done` from any phase without applying laws.
    /// Returns `false` if already done.
    pub fn abort(&mut self) -> bool {
        if self.is_done() {
            return false;
        }
        log::debug!("timeline: abort from phase {}", self.timeline.phase);
        self.enter_phase(Phase::Done, 0.0);
        true
    }

    fn enter_phase(&mut self, phase: Phase, carried: f32) {
        debug_assert!(phase >= self.timeline.phase, "phase order is monotonic");
        log::debug!(
            "timeline: {} -> {} (carried {carried:.4}s)",
            self.timeline.phase,
            phase
        );
        self.timeline = Timeline {
            phase,
            elapsed: carried,
        };
    }
}
