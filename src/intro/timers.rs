//! Deferred Timers
//!
//! One-shot timers driven by host timestamps. Each [`PendingTimer`] owns a
//! [`CancellationToken`]; firing consumes the timer, cancelling flips the
//! token. Neither can happen twice, so a cancel racing a fire (or a second
//! cancel) is a no-op.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Shared cancellation flag.
///
/// Cloning a token creates another handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Pending,
    Fired,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum Deadline {
    /// Anchored to the first timestamp the timer is polled with.
    After(Duration),
    At(Duration),
}

/// A one-shot deferred callback slot.
#[derive(Debug)]
pub struct PendingTimer {
    deadline: Deadline,
    token: CancellationToken,
    fired: bool,
}

impl PendingTimer {
    /// Fires `delay` after the first timestamp it is polled with.
    #[must_use]
    pub fn after(delay: Duration) -> Self {
        Self::with_deadline(Deadline::After(delay))
    }

    /// Fires at the absolute host timestamp `due`.
    #[must_use]
    pub fn at(due: Duration) -> Self {
        Self::with_deadline(Deadline::At(due))
    }

    fn with_deadline(deadline: Deadline) -> Self {
        Self {
            deadline,
            token: CancellationToken::new(),
            fired: false,
        }
    }

    /// Absolute due time, once known.
    #[must_use]
    pub fn due(&self) -> Option<Duration> {
        match self.deadline {
            Deadline::At(due) => Some(due),
            Deadline::After(_) => None,
        }
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        if self.fired {
            TimerState::Fired
        } else if self.token.is_cancelled() {
            TimerState::Cancelled
        } else {
            TimerState::Pending
        }
    }

    /// Cancels a pending timer. Returns whether this call cancelled it.
    pub fn cancel(&mut self) -> bool {
        if self.state() != TimerState::Pending {
            return false;
        }
        self.token.cancel();
        true
    }

    /// Returns `true` exactly once: on the first poll at or after the due
    /// time, unless cancelled.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.state() != TimerState::Pending {
            return false;
        }
        let due = match self.deadline {
            Deadline::At(due) => due,
            Deadline::After(delay) => {
                let due = now + delay;
                self.deadline = Deadline::At(due);
                due
            }
        };
        if now < due {
            return false;
        }
        self.fired = true;
        true
    }
}
