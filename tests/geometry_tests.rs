//! Geometry Tests
//!
//! Tests for:
//! - Procedural primitives: vertex/index counts and bounding spheres
//! - Grid draw groups and line topology
//! - Attribute writes bump the version
//! - Attribute readback helpers

use glam::Vec3;
use landfall::resources::geometry::Attribute;
use landfall::resources::primitives::{
    CylinderOptions, GRID_CENTER_GROUP, GRID_LINES_GROUP, SphereOptions, create_box,
    create_cylinder, create_grid, create_plane, create_points, create_sphere,
};
use wgpu::{PrimitiveTopology, VertexFormat};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
}

// ============================================================================
// Primitives
// ============================================================================

#[test]
fn box_has_four_vertices_per_face() {
    let geo = create_box(2.0, 2.0, 2.0);
    assert_eq!(geo.vertex_count(), 24);
    assert_eq!(geo.draw_count(), 36);
    assert_eq!(geo.topology, PrimitiveTopology::TriangleList);
    assert!(geo.attribute("normal").is_some());
    assert!(geo.attribute("uv").is_some());
}

#[test]
fn box_bounding_sphere_encloses_the_corners() {
    let geo = create_box(2.0, 2.0, 2.0);
    let sphere = geo.bounding_sphere().expect("bounding sphere");
    assert!(vec3_approx(sphere.center, Vec3::ZERO));
    assert!(approx(sphere.radius, 3.0_f32.sqrt()));
}

#[test]
fn box_normals_point_outwards() {
    let geo = create_box(1.0, 3.0, 5.0);
    let positions = geo.attribute("position").unwrap();
    let normals = geo.attribute("normal").unwrap();
    for i in 0..geo.vertex_count() {
        let p = positions.read_vec3(i).unwrap();
        let n = normals.read_vec3(i).unwrap();
        assert!(p.dot(n) > 0.0, "vertex {i}");
    }
}

#[test]
fn plane_is_a_single_quad() {
    let geo = create_plane(4.0, 2.0);
    assert_eq!(geo.vertex_count(), 4);
    assert_eq!(geo.indices(), Some(&[0, 1, 2, 0, 2, 3][..]));

    let sphere = geo.bounding_sphere().unwrap();
    assert!(approx(sphere.radius, Vec3::new(2.0, 1.0, 0.0).length()));
}

#[test]
fn sphere_vertices_lie_on_the_radius() {
    let geo = create_sphere(&SphereOptions::new(1.5, 16, 8));
    assert_eq!(geo.vertex_count(), 17 * 9);
    assert_eq!(geo.draw_count(), 16 * 8 * 6);

    let positions = geo.attribute("position").unwrap();
    for i in 0..geo.vertex_count() {
        let p = positions.read_vec3(i).unwrap();
        assert!(approx(p.length(), 1.5), "vertex {i}: {p}");
    }
    assert!(approx(geo.bounding_sphere().unwrap().radius, 1.5));
}

#[test]
fn sphere_segments_are_clamped() {
    let geo = create_sphere(&SphereOptions::new(1.0, 0, 0));
    assert_eq!(geo.vertex_count(), 4 * 3);
}

#[test]
fn dense_sphere_indices_stay_in_range() {
    let geo = create_sphere(&SphereOptions::new(1.0, 1000, 1000));
    assert_eq!(geo.vertex_count(), 256 * 256);

    let count = geo.vertex_count();
    let indices = geo.indices().expect("indexed sphere");
    assert_eq!(indices.len(), 255 * 255 * 6);
    assert!(indices.iter().all(|&i| u32::from(i) < count));
    assert_eq!(indices.iter().copied().max(), Some(u16::MAX));
}

#[test]
fn cylinder_has_caps_unless_open_ended() {
    let closed = create_cylinder(&CylinderOptions::cylinder(0.5, 0.5, 2.0, 8));
    let open = create_cylinder(&CylinderOptions::cylinder(0.5, 0.5, 2.0, 8).open_ended(true));

    // Torso: 2 rings of 9. Each cap: center + 9 ring vertices.
    assert_eq!(open.vertex_count(), 18);
    assert_eq!(closed.vertex_count(), 18 + 2 * 10);
    assert_eq!(open.draw_count(), 8 * 6);
    assert_eq!(closed.draw_count(), 8 * 6 + 2 * 8 * 3);
    assert_eq!(closed.label, "CylinderGeometry");
}

#[test]
fn cone_skips_the_degenerate_top_cap() {
    let cone = create_cylinder(&CylinderOptions::cone(1.0, 2.0, 6));
    assert_eq!(cone.label, "ConeGeometry");
    assert_eq!(cone.vertex_count(), 14 + 8);

    let positions = cone.attribute("position").unwrap();
    let apex = positions.read_vec3(0).unwrap();
    assert!(vec3_approx(apex, Vec3::new(0.0, 1.0, 0.0)));
}

#[test]
fn grid_splits_center_lines_into_their_own_group() {
    let geo = create_grid(100.0, 50);
    assert_eq!(geo.topology, PrimitiveTopology::LineList);
    assert_eq!(geo.vertex_count(), 51 * 4);
    assert!(geo.indices().is_none());

    let groups = geo.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].material_index, GRID_CENTER_GROUP);
    assert_eq!(groups[0].start, 0);
    assert_eq!(groups[0].count, 4);
    assert_eq!(groups[1].material_index, GRID_LINES_GROUP);
    assert_eq!(groups[1].start, 4);
    assert_eq!(groups[1].count, 200);

    let positions = geo.attribute("position").unwrap();
    for i in 0..4 {
        let p = positions.read_vec3(i).unwrap();
        assert!(approx(p.x, 0.0) || approx(p.z, 0.0), "center vertex {i}: {p}");
    }
}

#[test]
fn odd_grid_has_no_center_lines() {
    let geo = create_grid(10.0, 5);
    assert_eq!(geo.groups()[0].count, 0);
    assert_eq!(geo.groups()[1].count, 24);
}

#[test]
fn points_keep_one_vertex_per_position() {
    let positions = [Vec3::new(1.0, 0.0, 0.0), Vec3::new(-1.0, 2.0, 0.0), Vec3::ZERO];
    let geo = create_points(&positions);
    assert_eq!(geo.topology, PrimitiveTopology::PointList);
    assert_eq!(geo.vertex_count(), 3);

    let attribute = geo.attribute("position").unwrap();
    for (i, p) in positions.iter().enumerate() {
        assert_eq!(attribute.read_vec3(i as u32), Some(*p));
    }
}

#[test]
fn empty_points_have_no_bounding_sphere() {
    let geo = create_points(&[]);
    assert_eq!(geo.vertex_count(), 0);
    assert!(geo.bounding_sphere().is_none());
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn attribute_update_data_bumps_version() {
    let mut geo = create_points(&[Vec3::ZERO, Vec3::ONE]);
    let before = geo.attribute("position").unwrap().version;

    let attribute = geo.attribute_mut("position").unwrap();
    attribute.update_data(&[[0.0_f32, 1.0, 0.0], [2.0, 2.0, 2.0], [3.0, 3.0, 3.0]]);

    let attribute = geo.attribute("position").unwrap();
    assert!(attribute.version > before);
    assert_eq!(attribute.count, 3);
    assert_eq!(attribute.read_vec3(2), Some(Vec3::splat(3.0)));
    assert_eq!(geo.vertex_count(), 3);
}

#[test]
fn new_attributes_get_distinct_versions() {
    let a = Attribute::new_planar(&[[0.0_f32; 3]], VertexFormat::Float32x3);
    let b = Attribute::new_planar(&[[0.0_f32; 3]], VertexFormat::Float32x3);
    assert_ne!(a.version, b.version);
}

#[test]
fn read_vec3_rejects_other_formats_and_out_of_range() {
    let uv = Attribute::new_planar(&[[0.5_f32, 0.5]], VertexFormat::Float32x2);
    assert_eq!(uv.read_vec3(0), None);

    let position = Attribute::new_planar(&[[1.0_f32, 2.0, 3.0]], VertexFormat::Float32x3);
    assert_eq!(position.read_vec3(0), Some(Vec3::new(1.0, 2.0, 3.0)));
    assert_eq!(position.read_vec3(1), None);
}

#[test]
fn byte_size_counts_attributes_and_indices() {
    let geo = create_plane(1.0, 1.0);
    // position + normal + uv, then six u16 indices.
    assert_eq!(geo.byte_size(), 4 * 12 + 4 * 12 + 4 * 8 + 6 * 2);
}
