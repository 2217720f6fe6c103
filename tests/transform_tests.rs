//! Transform and Camera tests
//!
//! Tests for:
//! - Transform TRS operations and dirty checking
//! - Euler angle round-trip conversions
//! - look_at orientation
//! - Camera projection and aspect updates
//! - Deep hierarchies

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3, Vec4};
use landfall::scene::{Camera, Node, Scene, Transform};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Vec3::ZERO);
    assert_eq!(t.scale, Vec3::ONE);
    assert_eq!(t.quaternion(), Quat::IDENTITY);
}

#[test]
fn transform_update_local_matrix_dirty_check() {
    let mut t = Transform::new();

    // First call always updates
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.position = Vec3::new(1.0, 2.0, 3.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());

    t.rotation.y = 0.5;
    assert!(t.update_local_matrix());

    t.set_uniform_scale(2.0);
    assert!(t.update_local_matrix());
    assert!(!t.update_local_matrix());
}

#[test]
fn transform_local_matrix_reflects_trs() {
    let mut t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
    t.rotation = Vec3::new(0.0, FRAC_PI_2, 0.0);
    t.scale = Vec3::splat(2.0);
    t.update_local_matrix();

    let m = Mat4::from(*t.local_matrix());
    // +X rotated a quarter turn about Y points to -Z, then doubled.
    let x = m * Vec4::new(1.0, 0.0, 0.0, 0.0);
    assert!(vec3_approx(x.truncate(), Vec3::new(0.0, 0.0, -2.0)));
    assert!(vec3_approx(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0)));
}

#[test]
fn transform_euler_roundtrip() {
    let mut t = Transform::new();
    let q = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(0.2);
    t.set_quaternion(q);
    assert!(t.quaternion().angle_between(q) < 1e-4);
}

#[test]
fn transform_look_at_basic() {
    let mut t = Transform::new();
    t.look_at(Vec3::new(0.0, 0.0, -10.0), Vec3::Y);

    t.update_local_matrix();
    let mat = Mat4::from(*t.local_matrix());
    let forward = -mat.z_axis.truncate().normalize();
    assert!(vec3_approx(forward, Vec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn transform_look_at_collinear_up_noop() {
    let mut t = Transform::new();
    let original_rotation = t.rotation;
    t.look_at(Vec3::new(0.0, 10.0, 0.0), Vec3::Y);
    assert_eq!(t.rotation, original_rotation);
}

#[test]
fn transform_mark_dirty_forces_update() {
    let mut t = Transform::new();
    t.update_local_matrix();
    assert!(!t.update_local_matrix());

    t.mark_dirty();
    assert!(t.update_local_matrix());
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn camera_looks_at_its_target() {
    let mut camera = Camera::new_perspective(60.0, 16.0 / 9.0, 0.1, 1000.0);
    camera.set_position(Vec3::new(0.0, 8.0, 15.0));
    camera.look_at(Vec3::new(0.0, 2.0, 0.0));

    let expected = (Vec3::new(0.0, 2.0, 0.0) - camera.position()).normalize();
    assert!((camera.forward() - expected).length() < 1e-4);

    // The target projects onto the center of the screen.
    let clip = camera.view_projection_matrix() * Vec4::new(0.0, 2.0, 0.0, 1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
}

#[test]
fn camera_aspect_updates_projection() {
    let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let before = camera.projection_matrix();
    camera.set_aspect(2.0);
    let after = camera.projection_matrix();

    assert!(approx_eq(after.x_axis.x * 2.0, before.x_axis.x));
    assert!(approx_eq(after.y_axis.y, before.y_axis.y));
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn chain_accumulates_translations() {
    let mut scene = Scene::new();
    let mut parent = scene.root();
    let mut chain = Vec::new();
    for i in 0..5 {
        parent = scene.add_to_parent(
            Node::group(format!("Link{i}")).with_position(1.0, 0.0, 0.0),
            parent,
        );
        chain.push(parent);
    }
    scene.update_world_matrices();

    for (i, &key) in chain.iter().enumerate() {
        let x = scene.world_position(key).unwrap().x;
        assert!(approx_eq(x, (i + 1) as f32), "link {i}: x={x}");
    }
}

#[test]
fn rotated_parent_carries_children_around() {
    let mut scene = Scene::new();
    let parent = scene.add(Node::group("Pivot").with_rotation(0.0, FRAC_PI_2, 0.0));
    let child = scene.add_to_parent(Node::group("Arm").with_position(1.0, 0.0, 0.0), parent);
    scene.update_world_matrices();

    let p = scene.world_position(child).unwrap();
    assert!(vec3_approx(p, Vec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn deeply_nested_hierarchy_no_stack_overflow() {
    let mut scene = Scene::new();
    let mut parent = scene.root();
    for _ in 0..10_000 {
        parent = scene.add_to_parent(Node::group("Deep").with_position(0.0, 0.001, 0.0), parent);
    }
    scene.update_world_matrices();

    let y = scene.world_position(parent).unwrap().y;
    assert!((y - 10.0).abs() < 1e-2);
}
