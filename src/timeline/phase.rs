use std::fmt;

/// A named segment of the intro.
///
/// Phases are totally ordered; the timeline only ever moves forward through
/// [`Phase::ORDER`]. `Done` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Waiting,
    LightRayRise,
    Landing,
    CameraOrbit,
    WeaponReveal,
    Aiming,
    Flash,
    Done,
}

impl Phase {
    pub const ORDER: [Phase; 8] = [
        Phase::Waiting,
        Phase::LightRayRise,
        Phase::Landing,
        Phase::CameraOrbit,
        Phase::WeaponReveal,
        Phase::Aiming,
        Phase::Flash,
        Phase::Done,
    ];

    /// Phases driven by elapsed progress, in playback order.
    pub const ANIMATED: [Phase; 5] = [
        Phase::LightRayRise,
        Phase::Landing,
        Phase::CameraOrbit,
        Phase::WeaponReveal,
        Phase::Aiming,
    ];

    /// The phase that follows this one. `Done` maps to itself.
    #[must_use]
    pub const fn next(self) -> Phase {
        match self {
            Phase::Waiting => Phase::LightRayRise,
            Phase::LightRayRise => Phase::Landing,
            Phase::Landing => Phase::CameraOrbit,
            Phase::CameraOrbit => Phase::WeaponReveal,
            Phase::WeaponReveal => Phase::Aiming,
            Phase::Aiming => Phase::Flash,
            Phase::Flash | Phase::Done => Phase::Done,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_animated(self) -> bool {
        matches!(
            self,
            Phase::LightRayRise
                | Phase::Landing
                | Phase::CameraOrbit
                | Phase::WeaponReveal
                | Phase::Aiming
        )
    }

    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Phase::Done)
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::LightRayRise => "light-ray-rise",
            Phase::Landing => "landing",
            Phase::CameraOrbit => "camera-orbit",
            Phase::WeaponReveal => "weapon-reveal",
            Phase::Aiming => "aiming",
            Phase::Flash => "flash",
            Phase::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
