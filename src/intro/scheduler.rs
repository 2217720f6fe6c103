use std::time::Duration;

use crate::intro::timers::CancellationToken;

/// Repeating frame registration.
///
/// Converts the host's monotonic timestamps into clamped deltas. The first
/// frame after registration has a delta of zero; later deltas are capped at
/// `max_delta` seconds.
#[derive(Debug)]
pub struct FrameScheduler {
    registration: Option<CancellationToken>,
    last: Option<Duration>,
    max_delta: f32,
    frames: u64,
}

impl FrameScheduler {
    #[must_use]
    pub fn new(max_delta: f32) -> Self {
        Self {
            registration: None,
            last: None,
            max_delta,
            frames: 0,
        }
    }

    /// Registers the frame callback. Re-registering resets the delta origin.
    pub fn register(&mut self) -> CancellationToken {
        let token = CancellationToken::new();
        self.registration = Some(token.clone());
        self.last = None;
        token
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registration
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    /// Frames delivered since registration.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Delta in seconds for a frame at `now`, or `None` when not registered.
    pub fn tick(&mut self, now: Duration) -> Option<f32> {
        if !self.is_registered() {
            return None;
        }
        let dt = self
            .last
            .map_or(0.0, |last| now.saturating_sub(last).as_secs_f32())
            .min(self.max_delta);
        self.last = Some(now);
        self.frames += 1;
        Some(dt)
    }

    /// Removes the registration. Returns whether one was active.
    pub fn cancel(&mut self) -> bool {
        match self.registration.take() {
            Some(token) => {
                let active = !token.is_cancelled();
                token.cancel();
                active
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_delta_is_zero_then_clamped() {
        let mut scheduler = FrameScheduler::new(0.25);
        scheduler.register();
        assert_eq!(scheduler.tick(ms(1_000)), Some(0.0));
        let dt = scheduler.tick(ms(1_016)).unwrap();
        assert!((dt - 0.016).abs() < 1e-6);
        assert_eq!(scheduler.tick(ms(5_000)), Some(0.25));
    }

    #[test]
    fn unregistered_or_cancelled_yields_nothing() {
        let mut scheduler = FrameScheduler::new(0.25);
        assert_eq!(scheduler.tick(ms(0)), None);
        assert!(!scheduler.cancel());

        let token = scheduler.register();
        token.cancel();
        assert_eq!(scheduler.tick(ms(16)), None);
        assert!(!scheduler.cancel());
    }

    #[test]
    fn backwards_timestamps_give_zero_delta() {
        let mut scheduler = FrameScheduler::new(0.25);
        scheduler.register();
        scheduler.tick(ms(100));
        assert_eq!(scheduler.tick(ms(50)), Some(0.0));
    }
}
