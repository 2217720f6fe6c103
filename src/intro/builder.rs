//! Scene Builder
//!
//! Constructs the intro's static scene exactly once per sequencer:
//! environment, lights, particle field, light beam, character and weapon.
//!
//! Every geometry and material is stored in the [`ResourceArena`] and
//! announced to the [`RenderBackend`]. The first failed announcement aborts
//! the build; whatever was already allocated stays in the arena for the
//! caller to sweep.
//!
//! The nodes and resources the timeline animates are returned as
//! [`SceneHandles`].

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use smallvec::smallvec;

use crate::errors::Result;
use crate::host::Viewport;
use crate::render::RenderBackend;
use crate::resources::primitives::{
    CylinderOptions, SphereOptions, create_box, create_cylinder, create_grid, create_plane,
    create_points, create_sphere,
};
use crate::resources::{
    Blending, BufferKey, Geometry, GeometryKey, Material, MaterialKey, RawBuffer, ResourceArena,
    Side, color,
};
use crate::scene::{
    Camera, Fog, Light, MaterialSlot, Node, NodeKey, NodeKind, Renderable, Scene, ShadowConfig,
};
use crate::settings::IntroSettings;
use crate::timeline::laws::{DROP_HEIGHT, LOOK_TARGET};

pub const CAMERA_FOV: f32 = 60.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;
pub const CAMERA_START: Vec3 = Vec3::new(0.0, 8.0, 15.0);

pub const FOG_NEAR: f32 = 20.0;
pub const FOG_FAR: f32 = 100.0;

/// Half extent of the particle field on X and Z.
pub const PARTICLE_SPREAD: f32 = 25.0;
pub const PARTICLE_MIN_Y: f32 = 5.0;
pub const PARTICLE_MAX_Y: f32 = 25.0;

const HAIR_SPIKES: usize = 8;

/// Identities of everything the timeline animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneHandles {
    pub key_light: NodeKey,
    pub rim_light: NodeKey,
    pub point_light_1: NodeKey,
    pub point_light_2: NodeKey,
    pub character: NodeKey,
    pub right_arm: NodeKey,
    pub weapon: NodeKey,
    pub beam: NodeKey,
    pub beam_material: MaterialKey,
    pub particles: NodeKey,
    pub particle_geometry: GeometryKey,
    /// Raw particle positions, kept outside the scene graph.
    pub particle_buffer: BufferKey,
}

/// The output of a successful build.
#[derive(Debug)]
pub struct BuiltScene {
    pub scene: Scene,
    pub camera: Camera,
    pub handles: SceneHandles,
}

struct Lights {
    key: NodeKey,
    rim: NodeKey,
    point_1: NodeKey,
    point_2: NodeKey,
}

struct Particles {
    node: NodeKey,
    geometry: GeometryKey,
    buffer: BufferKey,
}

struct Character {
    root: NodeKey,
    right_arm: NodeKey,
}

/// One-shot builder borrowing the arena and renderer it allocates through.
pub struct SceneBuilder<'a, R: RenderBackend> {
    arena: &'a mut ResourceArena,
    renderer: &'a mut R,
    settings: &'a IntroSettings,
    rng: StdRng,
}

impl<'a, R: RenderBackend> SceneBuilder<'a, R> {
    pub fn new(
        arena: &'a mut ResourceArena,
        renderer: &'a mut R,
        settings: &'a IntroSettings,
    ) -> Self {
        Self {
            arena,
            renderer,
            settings,
            rng: StdRng::seed_from_u64(settings.seed),
        }
    }

    /// Builds the whole scene for a viewport of the given size.
    pub fn build(mut self, viewport: Viewport) -> Result<BuiltScene> {
        let mut scene = Scene::new();
        scene.background = color::rgb(color::BACKGROUND);
        scene.fog = Some(Fog::new(color::rgb(color::BACKGROUND), FOG_NEAR, FOG_FAR));

        let mut camera =
            Camera::new_perspective(CAMERA_FOV, viewport.aspect(), CAMERA_NEAR, CAMERA_FAR);
        camera.set_position(CAMERA_START);
        camera.look_at(LOOK_TARGET);

        self.build_ground(&mut scene)?;
        let lights = Self::build_lights(&mut scene);
        let particles = self.build_particles(&mut scene)?;
        let (beam, beam_material) = self.build_beam(&mut scene)?;
        let character = self.build_character(&mut scene)?;
        let weapon = self.build_weapon(&mut scene, character.root)?;

        scene.update_world_matrices();

        log::info!(
            "scene built: {} nodes, {} geometries, {} materials",
            scene.len(),
            self.arena.allocated().geometries,
            self.arena.allocated().materials
        );

        Ok(BuiltScene {
            scene,
            camera,
            handles: SceneHandles {
                key_light: lights.key,
                rim_light: lights.rim,
                point_light_1: lights.point_1,
                point_light_2: lights.point_2,
                character: character.root,
                right_arm: character.right_arm,
                weapon,
                beam,
                beam_material,
                particles: particles.node,
                particle_geometry: particles.geometry,
                particle_buffer: particles.buffer,
            },
        })
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    fn geometry(&mut self, geometry: Geometry) -> Result<GeometryKey> {
        let key = self.arena.add_geometry(geometry);
        let announced = match self.arena.geometry(key) {
            Some(geometry) => self.renderer.allocate_geometry(key, geometry),
            None => Ok(()),
        };
        if let Err(err) = announced {
            self.arena.release_geometry(key);
            return Err(err);
        }
        Ok(key)
    }

    fn material(&mut self, material: Material) -> Result<MaterialKey> {
        let key = self.arena.add_material(material);
        let announced = match self.arena.material(key) {
            Some(material) => self.renderer.allocate_material(key, material),
            None => Ok(()),
        };
        if let Err(err) = announced {
            self.arena.release_material(key);
            return Err(err);
        }
        Ok(key)
    }

    fn mesh(&mut self, geometry: Geometry, material: MaterialKey) -> Result<Renderable> {
        Ok(Renderable::new(self.geometry(geometry)?, material))
    }

    // ========================================================================
    // Environment
    // ========================================================================

    fn build_ground(&mut self, scene: &mut Scene) -> Result<()> {
        let ground_group = scene.add(Node::group("Ground"));

        let ground_material = self.material(
            Material::new_phong(color::rgb(color::SURFACE))
                .with_opacity(0.8)
                .with_shininess(100.0),
        )?;
        let ground = self.mesh(create_plane(100.0, 100.0), ground_material)?;
        scene.add_to_parent(
            Node::mesh("GroundPlane", ground)
                .with_rotation(-FRAC_PI_2, 0.0, 0.0)
                .receiving_shadow(),
            ground_group,
        );

        let grid_geometry = self.geometry(create_grid(100.0, 50))?;
        let center_lines = self.material(
            Material::new_line(color::rgb(color::IRIS))
                .with_label("GridCenterLines")
                .with_opacity(0.3),
        )?;
        let grid_lines = self.material(
            Material::new_line(color::rgb(color::ROSE))
                .with_label("GridLines")
                .with_opacity(0.3),
        )?;
        let grid = Renderable::new(
            grid_geometry,
            MaterialSlot::Multi(smallvec![center_lines, grid_lines]),
        );
        scene.add_to_parent(
            Node::new("Grid", NodeKind::LineSegments(grid)),
            ground_group,
        );

        Ok(())
    }

    fn build_lights(scene: &mut Scene) -> Lights {
        scene.add(Node::light(
            "AmbientLight",
            Light::new_ambient(color::rgb(color::IRIS), 0.4),
        ));

        let key = scene.add(
            Node::light(
                "KeyLight",
                Light::new_directional(color::rgb(color::ROSE), 2.0).with_shadows(ShadowConfig {
                    map_size: 4096,
                    ..Default::default()
                }),
            )
            .with_position(10.0, 20.0, 10.0),
        );
        let rim = scene.add(
            Node::light("RimLight", Light::new_directional(color::rgb(color::GOLD), 1.0))
                .with_position(-10.0, 10.0, -10.0),
        );
        let point_1 = scene.add(
            Node::light("PointLight1", Light::new_point(color::rgb(color::FOAM), 1.0, 30.0))
                .with_position(5.0, 5.0, 5.0),
        );
        let point_2 = scene.add(
            Node::light("PointLight2", Light::new_point(color::rgb(color::LOVE), 0.8, 25.0))
                .with_position(-8.0, 3.0, -5.0),
        );

        Lights {
            key,
            rim,
            point_1,
            point_2,
        }
    }

    fn build_particles(&mut self, scene: &mut Scene) -> Result<Particles> {
        let count = self.settings.particle_count;
        let positions: Vec<Vec3> = (0..count)
            .map(|_| {
                Vec3::new(
                    self.rng.random_range(-PARTICLE_SPREAD..PARTICLE_SPREAD),
                    self.rng.random_range(PARTICLE_MIN_Y..PARTICLE_MAX_Y),
                    self.rng.random_range(-PARTICLE_SPREAD..PARTICLE_SPREAD),
                )
            })
            .collect();

        let raw: Vec<f32> = positions.iter().flat_map(|p| p.to_array()).collect();
        let buffer = self.arena.add_buffer(RawBuffer::new("ParticlePositions", raw));

        let geometry = self.geometry(create_points(&positions))?;
        let material = self.material(
            Material::new_points(color::rgb(color::FOAM), 0.1)
                .with_opacity(0.6)
                .with_blending(Blending::Additive),
        )?;
        let node = scene.add(Node::new(
            "Particles",
            NodeKind::Points(Renderable::new(geometry, material)),
        ));

        Ok(Particles {
            node,
            geometry,
            buffer,
        })
    }

    fn build_beam(&mut self, scene: &mut Scene) -> Result<(NodeKey, MaterialKey)> {
        let material = self.material(
            Material::new_basic(color::rgb(color::FOAM))
                .with_label("LightBeam")
                .with_opacity(0.0)
                .with_side(Side::Double)
                .with_blending(Blending::Additive),
        )?;
        let beam = self.mesh(
            create_cylinder(&CylinderOptions::cone(3.0, 25.0, 16).open_ended(true)),
            material,
        )?;
        let node = scene.add(
            Node::mesh("LightBeam", beam)
                .with_position(0.0, 15.0, 0.0)
                .with_rotation(PI, 0.0, 0.0),
        );
        Ok((node, material))
    }

    // ========================================================================
    // Character
    // ========================================================================

    fn build_character(&mut self, scene: &mut Scene) -> Result<Character> {
        let root = scene.add(Node::group("Character").with_position(0.0, DROP_HEIGHT, 0.0));

        let body_material = self.material(
            Material::new_phong(color::rgb(color::PINE))
                .with_shininess(30.0)
                .with_specular(color::rgb(0x111111)),
        )?;
        let body = self.mesh(create_box(1.2, 1.8, 0.6), body_material)?;
        scene.add_to_parent(
            Node::mesh("Body", body).with_position(0.0, 1.8, 0.0).casting_shadow(),
            root,
        );

        let chest_material = self.material(Material::new_phong(color::rgb(color::TEXT)))?;
        let chest = self.mesh(create_box(1.0, 0.3, 0.65), chest_material)?;
        scene.add_to_parent(
            Node::mesh("Chest", chest).with_position(0.0, 2.2, 0.0).casting_shadow(),
            root,
        );

        let head_material =
            self.material(Material::new_phong(color::rgb(color::OVERLAY)).with_shininess(10.0))?;
        let head = self.mesh(create_sphere(&SphereOptions::new(0.5, 32, 32)), head_material)?;
        scene.add_to_parent(
            Node::mesh("Head", head)
                .with_position(0.0, 3.2, 0.0)
                .with_scale(1.0, 1.1, 1.0)
                .casting_shadow(),
            root,
        );

        self.build_hair(scene, root)?;
        self.build_face(scene, root)?;

        // Arms share one geometry and one material.
        let arm_geometry = self.geometry(create_box(0.4, 1.2, 0.4))?;
        let arm_material =
            self.material(Material::new_phong(color::rgb(color::OVERLAY)).with_shininess(10.0))?;
        scene.add_to_parent(
            Node::mesh("LeftArm", Renderable::new(arm_geometry, arm_material))
                .with_position(-0.9, 1.8, 0.0)
                .with_rotation(0.0, 0.0, 0.2)
                .casting_shadow(),
            root,
        );
        let right_arm = scene.add_to_parent(
            Node::mesh("RightArm", Renderable::new(arm_geometry, arm_material))
                .with_position(0.9, 1.8, 0.0)
                .with_rotation(0.0, 0.0, -0.2)
                .casting_shadow(),
            root,
        );

        let shoulder_geometry = self.geometry(create_sphere(&SphereOptions::new(0.3, 16, 16)))?;
        let shoulder_material = self.material(Material::new_phong(color::rgb(color::PINE)))?;
        for (name, x) in [("LeftShoulder", -0.7), ("RightShoulder", 0.7)] {
            scene.add_to_parent(
                Node::mesh(name, Renderable::new(shoulder_geometry, shoulder_material))
                    .with_position(x, 2.4, 0.0)
                    .casting_shadow(),
                root,
            );
        }

        let leg_geometry = self.geometry(create_box(0.5, 1.4, 0.5))?;
        let leg_material =
            self.material(Material::new_phong(color::rgb(color::TEXT)).with_shininess(20.0))?;
        for (name, x) in [("LeftLeg", -0.35), ("RightLeg", 0.35)] {
            scene.add_to_parent(
                Node::mesh(name, Renderable::new(leg_geometry, leg_material))
                    .with_position(x, 0.5, 0.0)
                    .casting_shadow(),
                root,
            );
        }

        let boot_geometry = self.geometry(create_box(0.6, 0.3, 0.8))?;
        let boot_material = self.material(Material::new_phong(color::rgb(color::SUBTLE)))?;
        for (name, x) in [("LeftBoot", -0.35), ("RightBoot", 0.35)] {
            scene.add_to_parent(
                Node::mesh(name, Renderable::new(boot_geometry, boot_material))
                    .with_position(x, -0.15, 0.1)
                    .casting_shadow(),
                root,
            );
        }

        Ok(Character { root, right_arm })
    }

    fn build_hair(&mut self, scene: &mut Scene, parent: NodeKey) -> Result<()> {
        let hair = scene.add_to_parent(Node::group("Hair"), parent);

        let hair_material =
            self.material(Material::new_phong(color::rgb(color::TEXT)).with_shininess(80.0))?;
        let base = self.mesh(create_sphere(&SphereOptions::new(0.52, 16, 16)), hair_material)?;
        scene.add_to_parent(
            Node::mesh("HairBase", base)
                .with_position(0.0, 3.25, 0.0)
                .with_scale(1.0, 1.2, 1.0)
                .casting_shadow(),
            hair,
        );

        for i in 0..HAIR_SPIKES {
            let angle = i as f32 / HAIR_SPIKES as f32 * TAU;
            let tilt_x = self.rng.random_range(-0.15..0.15);
            let tilt_z = self.rng.random_range(-0.15..0.15);
            let spike =
                self.mesh(create_cylinder(&CylinderOptions::cone(0.1, 0.4, 6)), hair_material)?;
            scene.add_to_parent(
                Node::mesh("HairSpike", spike)
                    .with_position(angle.cos() * 0.4, 3.6, angle.sin() * 0.4)
                    .with_rotation(tilt_x, 0.0, tilt_z)
                    .casting_shadow(),
                hair,
            );
        }

        Ok(())
    }

    fn build_face(&mut self, scene: &mut Scene, parent: NodeKey) -> Result<()> {
        let eye_geometry = self.geometry(create_sphere(&SphereOptions::new(0.08, 16, 16)))?;
        let eye_material = self.material(
            Material::new_phong(color::rgb(color::FOAM)).with_emissive(color::rgb(color::PINE)),
        )?;
        let pupil_geometry = self.geometry(create_sphere(&SphereOptions::new(0.04, 8, 8)))?;
        let pupil_material = self.material(Material::new_basic(color::rgb(color::TEXT)))?;

        for (side, x) in [("Left", -0.18), ("Right", 0.18)] {
            scene.add_to_parent(
                Node::mesh(
                    format!("{side}Eye"),
                    Renderable::new(eye_geometry, eye_material),
                )
                .with_position(x, 3.25, 0.42),
                parent,
            );
            scene.add_to_parent(
                Node::mesh(
                    format!("{side}Pupil"),
                    Renderable::new(pupil_geometry, pupil_material),
                )
                .with_position(x, 3.25, 0.46),
                parent,
            );
        }

        Ok(())
    }

    // ========================================================================
    // Weapon
    // ========================================================================

    fn build_weapon(&mut self, scene: &mut Scene, character: NodeKey) -> Result<NodeKey> {
        let weapon = scene.add_to_parent(
            Node::group("Weapon")
                .with_position(0.8, 2.0, 0.0)
                .with_rotation(0.0, -0.1, 0.0)
                .with_visible(false),
            character,
        );

        let body_material = self.material(
            Material::new_phong(color::rgb(color::SUBTLE))
                .with_shininess(100.0)
                .with_specular(color::rgb(color::MUTED)),
        )?;
        let body = self.mesh(create_box(1.2, 0.25, 0.15), body_material)?;
        scene.add_to_parent(Node::mesh("WeaponBody", body), weapon);

        let detail_material = self.material(Material::new_phong(color::rgb(color::MUTED)))?;
        let detail = self.mesh(create_box(0.3, 0.1, 0.18), detail_material)?;
        scene.add_to_parent(
            Node::mesh("WeaponDetail", detail).with_position(0.2, 0.08, 0.0),
            weapon,
        );

        let barrel_material =
            self.material(Material::new_phong(color::rgb(color::MUTED)).with_shininess(150.0))?;
        let barrel = self.mesh(
            create_cylinder(&CylinderOptions::cylinder(0.04, 0.04, 0.8, 12)),
            barrel_material,
        )?;
        scene.add_to_parent(
            Node::mesh("Barrel", barrel)
                .with_position(0.8, 0.0, 0.0)
                .with_rotation(0.0, 0.0, FRAC_PI_2),
            weapon,
        );

        let muzzle_material = self.material(Material::new_phong(color::rgb(color::SUBTLE)))?;
        let muzzle = self.mesh(
            create_cylinder(&CylinderOptions::cylinder(0.06, 0.04, 0.1, 8)),
            muzzle_material,
        )?;
        scene.add_to_parent(
            Node::mesh("Muzzle", muzzle)
                .with_position(1.15, 0.0, 0.0)
                .with_rotation(0.0, 0.0, FRAC_PI_2),
            weapon,
        );

        let scope_material =
            self.material(Material::new_phong(color::rgb(color::SUBTLE)).with_shininess(80.0))?;
        let scope = self.mesh(
            create_cylinder(&CylinderOptions::cylinder(0.06, 0.06, 0.4, 12)),
            scope_material,
        )?;
        scene.add_to_parent(
            Node::mesh("Scope", scope)
                .with_position(0.2, 0.15, 0.0)
                .with_rotation(0.0, 0.0, FRAC_PI_2),
            weapon,
        );

        // Both lenses share one geometry and one material.
        let lens_geometry =
            self.geometry(create_cylinder(&CylinderOptions::cylinder(0.05, 0.05, 0.02, 12)))?;
        let lens_material =
            self.material(Material::new_phong(color::rgb(color::FOAM)).with_opacity(0.8))?;
        for (name, x) in [("FrontLens", 0.39), ("RearLens", 0.01)] {
            scene.add_to_parent(
                Node::mesh(name, Renderable::new(lens_geometry, lens_material))
                    .with_position(x, 0.15, 0.0)
                    .with_rotation(0.0, 0.0, FRAC_PI_2),
                weapon,
            );
        }

        Ok(weapon)
    }
}
