//! Intro Settings
//!
//! Configuration for a single intro sequencer instance.
//!
//! Every struct implements [`Default`] with the values of the shipped intro,
//! so hosts usually only override what they need:
//!
//! ```rust,ignore
//! use landfall::settings::{IntroSettings, PhaseTimings};
//!
//! let settings = IntroSettings::default()
//!     .with_timings(PhaseTimings { aiming: 2.0, ..Default::default() })
//!     .with_particle_count(400);
//! ```
//!
//! Settings can also be read from a JSON document; missing fields fall back
//! to their defaults:
//!
//! ```rust,ignore
//! let settings = IntroSettings::from_json_str(r#"{ "timings": { "landing": 3.0 } }"#)?;
//! ```

use serde::Deserialize;

use crate::errors::{LandfallError, Result};
use crate::timeline::Phase;

// ---------------------------------------------------------------------------
// PhaseTimings
// ---------------------------------------------------------------------------

/// Phase timing table, in seconds.
///
/// Immutable once handed to a sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhaseTimings {
    pub light_ray_rise: f32,
    pub landing: f32,
    pub camera_orbit: f32,
    pub weapon_reveal: f32,
    pub aiming: f32,
    /// Delay between entering `Flash` and the completion callback.
    pub flash_delay: f32,
    /// Idle delay between initialization and the automatic `start()`.
    pub auto_start_delay: f32,
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self {
            light_ray_rise: 1.5,
            landing: 2.5,
            camera_orbit: 6.0,
            weapon_reveal: 2.5,
            aiming: 3.0,
            flash_delay: 0.3,
            auto_start_delay: 1.5,
        }
    }
}

impl PhaseTimings {
    /// Duration of an animated phase. `None` for `Waiting`, `Flash` and `Done`,
    /// which are not driven by elapsed progress.
    #[must_use]
    pub fn duration(&self, phase: Phase) -> Option<f32> {
        match phase {
            Phase::LightRayRise => Some(self.light_ray_rise),
            Phase::Landing => Some(self.landing),
            Phase::CameraOrbit => Some(self.camera_orbit),
            Phase::WeaponReveal => Some(self.weapon_reveal),
            Phase::Aiming => Some(self.aiming),
            Phase::Waiting | Phase::Flash | Phase::Done => None,
        }
    }

    /// Sum of the animated phase durations (start → Flash entry).
    #[must_use]
    pub fn animated_total(&self) -> f32 {
        Phase::ANIMATED
            .iter()
            .filter_map(|&phase| self.duration(phase))
            .sum()
    }

    /// Time from `start()` to the completion callback.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.animated_total() + self.flash_delay
    }

    pub fn validate(&self) -> Result<()> {
        for phase in Phase::ANIMATED {
            let duration = self.duration(phase).unwrap_or_default();
            if !duration.is_finite() || duration <= 0.0 {
                return Err(LandfallError::InvalidSettings(format!(
                    "duration of {phase:?} must be positive, got {duration}"
                )));
            }
        }
        for (name, value) in [
            ("flash_delay", self.flash_delay),
            ("auto_start_delay", self.auto_start_delay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LandfallError::InvalidSettings(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RendererOptions
// ---------------------------------------------------------------------------

/// Options forwarded to [`MountPoint::create_renderer`](crate::host::MountPoint::create_renderer).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    pub antialias: bool,
    /// Surface keeps an alpha channel so the page shows through.
    pub alpha: bool,
    pub shadows: bool,
    pub tone_mapping_exposure: f32,
    pub vsync: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            antialias: true,
            alpha: true,
            shadows: true,
            tone_mapping_exposure: 1.2,
            vsync: true,
        }
    }
}

// ---------------------------------------------------------------------------
// IntroSettings
// ---------------------------------------------------------------------------

/// Top-level configuration of an intro sequencer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntroSettings {
    pub timings: PhaseTimings,
    pub renderer: RendererOptions,
    /// Number of atmosphere particles.
    pub particle_count: usize,
    /// Seed for particle placement and hair spike jitter.
    pub seed: u64,
    /// Upper bound applied to a single frame delta, in seconds.
    ///
    /// Absorbs stalls (tab switches, debugger pauses) without teleporting
    /// through several phases at once.
    pub max_frame_delta: f32,
}

impl Default for IntroSettings {
    fn default() -> Self {
        Self {
            timings: PhaseTimings::default(),
            renderer: RendererOptions::default(),
            particle_count: 200,
            seed: 42,
            max_frame_delta: 0.25,
        }
    }
}

impl IntroSettings {
    #[must_use]
    pub fn with_timings(mut self, timings: PhaseTimings) -> Self {
        self.timings = timings;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: RendererOptions) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.particle_count = count;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_max_frame_delta(mut self, max: f32) -> Self {
        self.max_frame_delta = max;
        self
    }

    /// Parses settings from JSON. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        self.timings.validate()?;
        if !self.max_frame_delta.is_finite() || self.max_frame_delta <= 0.0 {
            return Err(LandfallError::InvalidSettings(format!(
                "max_frame_delta must be positive, got {}",
                self.max_frame_delta
            )));
        }
        Ok(())
    }
}
