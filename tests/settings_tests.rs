//! Settings Tests
//!
//! Tests for:
//! - Default phase table and derived totals
//! - JSON loading with partial overrides
//! - Validation of durations, delays and frame delta clamping

use landfall::{IntroSettings, LandfallError, Phase, PhaseTimings};

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

#[test]
fn default_timings_match_the_shipped_intro() {
    let timings = PhaseTimings::default();
    assert!(approx(timings.animated_total(), 15.5));
    assert!(approx(timings.total(), 15.8));
    assert!(approx(timings.auto_start_delay, 1.5));

    assert_eq!(timings.duration(Phase::Landing), Some(2.5));
    assert_eq!(timings.duration(Phase::Waiting), None);
    assert_eq!(timings.duration(Phase::Flash), None);
    assert_eq!(timings.duration(Phase::Done), None);
    assert!(IntroSettings::default().validate().is_ok());
}

#[test]
fn empty_json_yields_defaults() -> anyhow::Result<()> {
    let settings = IntroSettings::from_json_str("{}")?;
    assert_eq!(settings, IntroSettings::default());
    Ok(())
}

#[test]
fn json_overrides_only_what_it_names() -> anyhow::Result<()> {
    let settings = IntroSettings::from_json_str(
        r#"{
            "timings": { "landing": 3.0, "flash_delay": 0.5 },
            "renderer": { "shadows": false },
            "particle_count": 50
        }"#,
    )?;

    assert!(approx(settings.timings.landing, 3.0));
    assert!(approx(settings.timings.flash_delay, 0.5));
    assert!(approx(settings.timings.camera_orbit, 6.0));
    assert!(!settings.renderer.shadows);
    assert!(settings.renderer.antialias);
    assert_eq!(settings.particle_count, 50);
    assert_eq!(settings.seed, IntroSettings::default().seed);
    assert!(approx(settings.timings.total(), 16.5));
    Ok(())
}

#[test]
fn malformed_json_is_a_config_error() {
    let result = IntroSettings::from_json_str(r#"{ "timings": "#);
    assert!(matches!(result, Err(LandfallError::Config(_))));

    let result = IntroSettings::from_json_str(r#"{ "particle_count": -3 }"#);
    assert!(matches!(result, Err(LandfallError::Config(_))));
}

#[test]
fn non_positive_durations_are_rejected() {
    for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
        let timings = PhaseTimings {
            aiming: bad,
            ..Default::default()
        };
        assert!(
            matches!(timings.validate(), Err(LandfallError::InvalidSettings(_))),
            "aiming = {bad}"
        );
    }
}

#[test]
fn delays_may_be_zero_but_not_negative() {
    let zero = PhaseTimings {
        flash_delay: 0.0,
        auto_start_delay: 0.0,
        ..Default::default()
    };
    assert!(zero.validate().is_ok());

    let negative = PhaseTimings {
        auto_start_delay: -0.1,
        ..Default::default()
    };
    let err = negative.validate().unwrap_err();
    assert!(err.to_string().contains("auto_start_delay"), "{err}");
}

#[test]
fn frame_delta_clamp_must_be_positive() {
    let settings = IntroSettings::default().with_max_frame_delta(0.0);
    assert!(matches!(
        settings.validate(),
        Err(LandfallError::InvalidSettings(_))
    ));

    let result = IntroSettings::from_json_str(r#"{ "max_frame_delta": -1.0 }"#);
    assert!(matches!(result, Err(LandfallError::InvalidSettings(_))));
}
