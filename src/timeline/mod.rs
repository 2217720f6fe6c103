//! Timeline
//!
//! The phase state machine that drives the intro:
//! - [`Phase`]: ordered phase tags
//! - [`TimelineController`]: advances a [`Timeline`] by elapsed-time deltas
//! - [`laws`]: per-phase animation laws in a dispatch table
//! - [`easing`]: easing curves used by the laws

pub mod controller;
pub mod easing;
pub mod laws;
pub mod phase;

pub use controller::{Entered, Timeline, TimelineController};
pub use laws::{AnimationTargets, PhaseLaw, PhaseProgress};
pub use phase::Phase;
