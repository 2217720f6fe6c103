//! Scene Graph and Builder Tests
//!
//! Tests for:
//! - Scene: parenting, traversal order, world matrices, visibility culling
//! - SceneBuilder: handles, lights, particles, shared resources
//! - Shadow light and caster selection
//! - Deterministic particle placement

mod common;

use std::collections::HashSet;

use glam::Vec3;
use landfall::intro::builder::{
    CAMERA_START, FOG_FAR, FOG_NEAR, PARTICLE_MAX_Y, PARTICLE_MIN_Y, PARTICLE_SPREAD,
};
use landfall::resources::primitives::create_box;
use landfall::resources::{Blending, Material};
use landfall::scene::{LightKind, MaterialSlot, NodeKey, NodeKind, Renderable, ShadowConfig};
use landfall::timeline::laws::DROP_HEIGHT;
use landfall::{IntroSettings, Light, Node, ResourceArena, Scene};

use common::{approx, build_scene};

// ============================================================================
// Scene graph
// ============================================================================

#[test]
fn new_scene_has_only_a_root() {
    let scene = Scene::new();
    assert_eq!(scene.len(), 1);
    assert!(scene.get(scene.root()).is_some());
    assert_eq!(scene.find_by_name("Scene"), Some(scene.root()));
}

#[test]
fn unknown_parent_falls_back_to_root() {
    let mut scene = Scene::new();
    let orphan = scene.add_to_parent(Node::group("Orphan"), NodeKey::default());
    assert_eq!(scene.get(orphan).unwrap().parent(), Some(scene.root()));
    assert!(scene.get(scene.root()).unwrap().children().contains(&orphan));
}

#[test]
fn traversal_is_depth_first_in_insertion_order() {
    let mut scene = Scene::new();
    let a = scene.add(Node::group("A"));
    let a1 = scene.add_to_parent(Node::group("A1"), a);
    let b = scene.add(Node::group("B"));
    let a2 = scene.add_to_parent(Node::group("A2"), a);

    let order = scene.depth_first();
    assert_eq!(order, vec![scene.root(), a, a1, a2, b]);
}

#[test]
fn world_matrices_compose_parent_first() {
    let mut scene = Scene::new();
    let parent = scene.add(Node::group("Parent").with_position(1.0, 2.0, 3.0));
    let child = scene.add_to_parent(Node::group("Child").with_position(0.0, 1.0, 0.0), parent);
    let grandchild =
        scene.add_to_parent(Node::group("Grandchild").with_scale(2.0, 2.0, 2.0), child);

    scene.update_world_matrices();
    let p = scene.world_position(child).unwrap();
    assert!(approx(p.x, 1.0) && approx(p.y, 3.0) && approx(p.z, 3.0));

    scene.get_mut(parent).unwrap().transform.position.x = 5.0;
    scene.update_world_matrices();
    let p = scene.world_position(grandchild).unwrap();
    assert!(approx(p.x, 5.0) && approx(p.y, 3.0));
}

#[test]
fn hidden_nodes_hide_their_subtree() {
    let mut arena = ResourceArena::new();
    let geometry = arena.add_geometry(create_box(1.0, 1.0, 1.0));
    let material = arena.add_material(Material::new_basic(Vec3::ONE));

    let mut scene = Scene::new();
    let group = scene.add(Node::group("Group").with_visible(false));
    scene.add_to_parent(Node::mesh("Inner", Renderable::new(geometry, material)), group);
    scene.add(Node::mesh("Outer", Renderable::new(geometry, material)));
    scene.add_to_parent(
        Node::light("Lamp", Light::new_point(Vec3::ONE, 1.0, 10.0)),
        group,
    );
    scene.update_world_matrices();

    assert_eq!(scene.draw_items().len(), 1);
    assert!(scene.lights().is_empty());

    scene.get_mut(group).unwrap().visible = true;
    assert_eq!(scene.draw_items().len(), 2);
    assert_eq!(scene.lights().len(), 1);
}

// ============================================================================
// Builder
// ============================================================================

#[test]
fn builder_sets_up_camera_and_environment() {
    let (_, _, built) = build_scene(&IntroSettings::default());

    assert!((built.camera.position() - CAMERA_START).length() < 1e-5);
    assert!(approx(built.camera.aspect, 1280.0 / 720.0));

    let fog = built.scene.fog.expect("fog");
    assert!(approx(fog.near, FOG_NEAR));
    assert!(approx(fog.far, FOG_FAR));
    assert!(built.scene.find_by_name("GroundPlane").is_some());
}

#[test]
fn builder_hands_out_live_handles() {
    let (arena, _, built) = build_scene(&IntroSettings::default());
    let scene = &built.scene;
    let h = built.handles;

    for key in [
        h.key_light,
        h.rim_light,
        h.point_light_1,
        h.point_light_2,
        h.character,
        h.right_arm,
        h.weapon,
        h.beam,
        h.particles,
    ] {
        assert!(scene.get(key).is_some());
    }
    assert!(arena.geometry(h.particle_geometry).is_some());
    assert!(arena.buffer(h.particle_buffer).is_some());

    let beam = arena.material(h.beam_material).unwrap();
    assert_eq!(beam.opacity, 0.0);
    assert_eq!(beam.blending, Blending::Additive);

    let character = scene.get(h.character).unwrap();
    assert!(approx(character.transform.position.y, DROP_HEIGHT));
    assert_eq!(scene.find_by_name("RightArm"), Some(h.right_arm));
}

#[test]
fn builder_adds_five_lights() {
    let (_, _, built) = build_scene(&IntroSettings::default());
    let lights = built.scene.lights();
    assert_eq!(lights.len(), 5);
    assert_eq!(
        lights
            .iter()
            .filter(|(l, _)| matches!(l.kind, LightKind::Ambient))
            .count(),
        1
    );

    let key = built.scene.light(built.handles.key_light).unwrap();
    assert!(key.cast_shadows);
    assert_eq!(key.shadow.as_ref().unwrap().map_size, 4096);
}

#[test]
fn key_light_is_the_shadow_light() {
    let (_, _, mut built) = build_scene(&IntroSettings::default());
    built.scene.update_world_matrices();

    let shadow = built.scene.shadow_light().expect("shadow light");
    assert!(std::ptr::eq(
        shadow.light,
        built.scene.light(built.handles.key_light).unwrap()
    ));
    assert!((shadow.position - Vec3::new(10.0, 20.0, 10.0)).length() < 1e-5);
    assert_eq!(shadow.config.map_size, 4096);

    // The light looks at the origin: it lands mid-map, inside the depth range.
    let center = shadow.view_projection.project_point3(Vec3::ZERO);
    assert!(center.x.abs() < 1e-4 && center.y.abs() < 1e-4, "{center}");
    assert!(center.z > 0.0 && center.z < 1.0, "{center}");

    let casters = built.scene.shadow_casters();
    let body = built.scene.find_by_name("Body").unwrap();
    assert!(casters.iter().any(|item| item.node == body));
    assert!(casters.iter().all(|item| item.renderable.cast_shadow));
    let ground = built.scene.find_by_name("GroundPlane").unwrap();
    assert!(casters.iter().all(|item| item.node != ground));
}

#[test]
fn only_configured_directional_lights_cast_shadows() {
    let mut arena = ResourceArena::new();
    let geometry = arena.add_geometry(create_box(1.0, 1.0, 1.0));
    let material = arena.add_material(Material::new_basic(Vec3::ONE));

    let mut scene = Scene::new();
    let mut unconfigured = Light::new_directional(Vec3::ONE, 1.0);
    unconfigured.cast_shadows = true;
    scene.add(Node::light("Unconfigured", unconfigured));
    scene.add(Node::light(
        "Point",
        Light::new_point(Vec3::ONE, 1.0, 10.0).with_shadows(ShadowConfig::default()),
    ));
    scene.add(Node::new(
        "Dust",
        NodeKind::Points(Renderable {
            cast_shadow: true,
            ..Renderable::new(geometry, material)
        }),
    ));
    scene.update_world_matrices();
    assert!(scene.shadow_light().is_none());
    assert!(scene.shadow_casters().is_empty());

    let hidden = scene.add(
        Node::light(
            "Hidden",
            Light::new_directional(Vec3::ONE, 1.0).with_shadows(ShadowConfig::default()),
        )
        .with_position(0.0, 5.0, 0.0),
    );
    scene.get_mut(hidden).unwrap().visible = false;
    assert!(scene.shadow_light().is_none());

    scene.get_mut(hidden).unwrap().visible = true;
    scene.update_world_matrices();
    assert!(scene.shadow_light().is_some());
}

#[test]
fn weapon_starts_hidden_under_the_character() {
    let (_, _, built) = build_scene(&IntroSettings::default());
    let weapon = built.scene.get(built.handles.weapon).unwrap();
    assert!(!weapon.visible);
    assert_eq!(weapon.parent(), Some(built.handles.character));
    assert_eq!(weapon.children().len(), 7);

    let hidden = built.scene.draw_items().len();
    let mut scene = built.scene;
    scene.get_mut(built.handles.weapon).unwrap().visible = true;
    assert_eq!(scene.draw_items().len(), hidden + 7);
}

#[test]
fn grid_uses_two_materials() {
    let (arena, _, built) = build_scene(&IntroSettings::default());
    let grid = built.scene.get(built.scene.find_by_name("Grid").unwrap()).unwrap();
    let NodeKind::LineSegments(renderable) = &grid.kind else {
        panic!("grid is a line set");
    };
    let MaterialSlot::Multi(materials) = &renderable.materials else {
        panic!("grid has one material per group");
    };
    assert_eq!(materials.len(), 2);
    assert_eq!(arena.geometry(renderable.geometry).unwrap().groups().len(), 2);
}

#[test]
fn shared_geometry_and_materials_are_allocated_once() {
    let (arena, renderer, built) = build_scene(&IntroSettings::default());

    let mut geometries = HashSet::new();
    let mut materials = HashSet::new();
    let mut renderables = 0;
    built.scene.traverse(|_, node| {
        if let Some(r) = node.kind.renderable() {
            renderables += 1;
            geometries.insert(r.geometry);
            materials.extend(r.materials.iter());
        }
    });

    assert!(renderables > geometries.len());
    assert_eq!(arena.allocated().geometries, geometries.len());
    assert_eq!(arena.allocated().materials, materials.len());
    assert_eq!(arena.allocated().buffers, 1);

    let log = renderer.log();
    let log = log.borrow();
    assert_eq!(log.geometry_allocations, geometries.len());
    assert_eq!(log.material_allocations, materials.len());

    let scene = &built.scene;
    let arm = |name| match &scene.get(scene.find_by_name(name).unwrap()).unwrap().kind {
        NodeKind::Mesh(r) => r.clone(),
        _ => panic!("{name} is a mesh"),
    };
    assert_eq!(arm("LeftArm"), arm("RightArm"));
}

#[test]
fn particles_are_seeded() {
    let settings = IntroSettings::default().with_particle_count(64);
    let (a, _, built_a) = build_scene(&settings);
    let (b, _, built_b) = build_scene(&settings);
    let (c, _, built_c) = build_scene(&settings.clone().with_seed(7));

    let positions = |arena: &ResourceArena, key| arena.buffer(key).unwrap().as_vec3s().to_vec();
    let pa = positions(&a, built_a.handles.particle_buffer);
    let pb = positions(&b, built_b.handles.particle_buffer);
    let pc = positions(&c, built_c.handles.particle_buffer);

    assert_eq!(pa.len(), 64);
    assert_eq!(pa, pb);
    assert_ne!(pa, pc);

    for [x, y, z] in pa {
        assert!((-PARTICLE_SPREAD..PARTICLE_SPREAD).contains(&x));
        assert!((PARTICLE_MIN_Y..PARTICLE_MAX_Y).contains(&y));
        assert!((-PARTICLE_SPREAD..PARTICLE_SPREAD).contains(&z));
    }

    let geometry = a.geometry(built_a.handles.particle_geometry).unwrap();
    assert_eq!(geometry.vertex_count(), 64);
}
