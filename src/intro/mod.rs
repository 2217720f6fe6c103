//! Intro Sequence
//!
//! Everything that turns a mount point into a played intro:
//! - [`builder`]: one-shot scene construction
//! - [`scheduler`]: frame registration and delta computation
//! - [`timers`]: cancellable auto-start and flash-completion timers
//! - [`lifecycle`]: teardown steps
//! - [`IntroSequencer`]: the host-facing driver tying them together
//!
//! # Usage
//!
//! ```rust,ignore
//! use landfall::intro::IntroSequencer;
//! use landfall::settings::IntroSettings;
//!
//! let mut intro = IntroSequencer::initialize(mount, IntroSettings::default(), || {
//!     show_portfolio();
//! })?;
//!
//! // every display refresh
//! intro.frame(clock.elapsed());
//!
//! // when the host swaps views
//! let report = intro.teardown();
//! ```

pub mod builder;
pub mod lifecycle;
pub mod scheduler;
pub mod sequencer;
pub mod timers;

pub use builder::{BuiltScene, SceneBuilder, SceneHandles};
pub use lifecycle::TeardownReport;
pub use scheduler::FrameScheduler;
pub use sequencer::IntroSequencer;
pub use timers::{CancellationToken, PendingTimer, TimerState};
