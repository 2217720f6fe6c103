//! Phase Laws
//!
//! Each animated phase owns a pure function of its progress that writes the
//! animated properties of the scene. The functions are looked up through a
//! dispatch table keyed by [`Phase`]; `Flash` has an entry effect only.
//!
//! Laws never change the graph's structure. They write transforms,
//! visibility, light intensities and material opacity on nodes and resources
//! that the builder handed out as [`SceneHandles`].

use std::f32::consts::{PI, TAU};

use glam::{Vec3, Vec4};

use crate::intro::builder::SceneHandles;
use crate::resources::{ResourceArena, color};
use crate::scene::{Camera, Node, NodeKey, Scene};
use crate::timeline::Phase;
use crate::timeline::easing::{ease_out_quart, remap_tail, smoothstep};

/// Height the character drops from.
pub const DROP_HEIGHT: f32 = 25.0;
/// Point the camera keeps aiming at.
pub const LOOK_TARGET: Vec3 = Vec3::new(0.0, 2.0, 0.0);
/// Camera position on entry to `WeaponReveal`.
pub const REVEAL_CAMERA: Vec3 = Vec3::new(0.0, 3.0, 8.0);
/// Where the first point light moves to light the weapon.
pub const WEAPON_GLOW: Vec3 = Vec3::new(0.8, 2.0, 0.0);
/// Progress at which the weapon starts to materialize.
pub const WEAPON_THRESHOLD: f32 = 0.3;
/// Progress at which the landing impact starts to flare.
pub const IMPACT_THRESHOLD: f32 = 0.8;

pub const FLASH_KEY_INTENSITY: f32 = 15.0;
pub const FLASH_POINT_INTENSITY: f32 = 10.0;

/// Particle field spin about Y, rad/s.
pub const PARTICLE_SPIN: f32 = 0.0625;
/// Particle rise speed, units/s.
pub const PARTICLE_RISE: f32 = 0.625;
/// Particles above this height wrap back to the ground.
pub const PARTICLE_CEILING: f32 = 25.0;

// ============================================================================
// Targets
// ============================================================================

/// Everything a law may write, borrowed for the duration of one tick.
pub struct AnimationTargets<'a> {
    pub scene: &'a mut Scene,
    pub camera: &'a mut Camera,
    pub resources: &'a mut ResourceArena,
    pub handles: &'a SceneHandles,
    /// Set by a law that changes the renderer clear color; the sequencer
    /// forwards it to the backend after the tick.
    pub clear_color: Option<Vec4>,
}

impl<'a> AnimationTargets<'a> {
    pub fn new(
        scene: &'a mut Scene,
        camera: &'a mut Camera,
        resources: &'a mut ResourceArena,
        handles: &'a SceneHandles,
    ) -> Self {
        Self {
            scene,
            camera,
            resources,
            handles,
            clear_color: None,
        }
    }

    #[inline]
    fn node(&mut self, key: NodeKey) -> Option<&mut Node> {
        self.scene.get_mut(key)
    }

    fn set_intensity(&mut self, key: NodeKey, intensity: f32) {
        if let Some(light) = self.scene.light_mut(key) {
            light.intensity = intensity;
        }
    }

    fn set_beam_opacity(&mut self, opacity: f32) {
        if let Some(material) = self.resources.material_mut(self.handles.beam_material) {
            material.opacity = opacity;
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Position inside the current phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseProgress {
    /// Normalized progress in `[0, 1]`.
    pub progress: f32,
    /// Seconds elapsed since the phase was entered.
    pub elapsed: f32,
}

pub type PhaseLaw = fn(PhaseProgress, &mut AnimationTargets<'_>);

const LAWS: [(Phase, PhaseLaw); 5] = [
    (Phase::LightRayRise, light_ray_rise),
    (Phase::Landing, landing),
    (Phase::CameraOrbit, camera_orbit),
    (Phase::WeaponReveal, weapon_reveal),
    (Phase::Aiming, aiming),
];

/// The per-frame law of `phase`, if it has one.
#[must_use]
pub fn law_for(phase: Phase) -> Option<PhaseLaw> {
    LAWS.iter()
        .find(|(p, _)| *p == phase)
        .map(|&(_, law)| law)
}

/// Applies the one-shot effect of entering `phase`.
pub fn enter(phase: Phase, targets: &mut AnimationTargets<'_>) {
    match phase {
        Phase::WeaponReveal => {
            targets.camera.set_position(REVEAL_CAMERA);
            targets.camera.look_at(LOOK_TARGET);
        }
        Phase::Flash => flash(targets),
        _ => {}
    }
}

// ============================================================================
// Laws
// ============================================================================

fn light_ray_rise(at: PhaseProgress, targets: &mut AnimationTargets<'_>) {
    let t = at.elapsed;
    let handles = targets.handles;
    targets.set_beam_opacity((t * 0.8).min(0.6));
    targets.set_intensity(handles.key_light, 2.0 + t * 3.0);
    targets.set_intensity(handles.point_light_1, 1.0 + t * 2.0);
}

fn landing(at: PhaseProgress, targets: &mut AnimationTargets<'_>) {
    let p = at.progress;
    let handles = targets.handles;
    if let Some(character) = targets.node(handles.character) {
        character.transform.position.y = DROP_HEIGHT * (1.0 - ease_out_quart(p));
    }
    if p > IMPACT_THRESHOLD {
        targets.set_intensity(handles.point_light_2, 0.8 + (p - IMPACT_THRESHOLD) * 5.0);
    }
    targets.set_beam_opacity(0.6 * (1.0 - p));
}

fn camera_orbit(at: PhaseProgress, targets: &mut AnimationTargets<'_>) {
    let p = at.progress;
    let angle = p * PI * 2.5;
    let radius = 12.0 - p * 3.0;
    targets.camera.set_position(Vec3::new(
        angle.sin() * radius,
        8.0 + (p * TAU).sin() * 3.0,
        angle.cos() * radius,
    ));
    targets.camera.look_at(LOOK_TARGET);
}

fn weapon_reveal(at: PhaseProgress, targets: &mut AnimationTargets<'_>) {
    let p = at.progress;
    let handles = targets.handles;
    if let Some(arm) = targets.node(handles.right_arm) {
        arm.transform.rotation.z = -0.2 - p * 1.8;
        arm.transform.rotation.x = p * 0.3;
    }

    if p > WEAPON_THRESHOLD {
        let q = remap_tail(p, WEAPON_THRESHOLD);
        if let Some(weapon) = targets.node(handles.weapon) {
            weapon.visible = true;
            weapon.transform.set_uniform_scale(q);
        }
        if let Some(glow) = targets.node(handles.point_light_1) {
            glow.transform.position = WEAPON_GLOW;
        }
        targets.set_intensity(handles.point_light_1, 1.0 + q * 2.0);
    }
}

fn aiming(at: PhaseProgress, targets: &mut AnimationTargets<'_>) {
    let s = smoothstep(at.progress);
    let handles = targets.handles;
    if let Some(character) = targets.node(handles.character) {
        character.transform.rotation.y = s * PI;
    }
    targets.camera.transform.position.x = (s * 0.3).sin() * 2.0;
}

fn flash(targets: &mut AnimationTargets<'_>) {
    let handles = targets.handles;
    targets.scene.background = color::rgb(color::BACKGROUND);
    targets.clear_color = Some(color::rgba(color::BACKGROUND, 1.0));
    targets.set_intensity(handles.key_light, FLASH_KEY_INTENSITY);
    targets.set_intensity(handles.point_light_1, FLASH_POINT_INTENSITY);
    targets.set_intensity(handles.point_light_2, FLASH_POINT_INTENSITY);
}

// ============================================================================
// Ambient
// ============================================================================

/// Spins the particle field and lifts every particle, wrapping at the
/// ceiling, then refreshes the points geometry from the raw buffer.
pub fn drift_particles(dt: f32, targets: &mut AnimationTargets<'_>) {
    let handles = targets.handles;
    if let Some(field) = targets.node(handles.particles) {
        field.transform.rotation.y += PARTICLE_SPIN * dt;
    }

    let Some(buffer) = targets.resources.buffer_mut(handles.particle_buffer) else {
        return;
    };
    for position in buffer.as_vec3s_mut() {
        position[1] += PARTICLE_RISE * dt;
        if position[1] > PARTICLE_CEILING {
            position[1] = 0.0;
        }
    }
    let positions = buffer.as_vec3s().to_vec();

    if let Some(attribute) = targets
        .resources
        .geometry_mut(handles.particle_geometry)
        .and_then(|geometry| geometry.attribute_mut("position"))
    {
        attribute.update_data(&positions);
    }
}
